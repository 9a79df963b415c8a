// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A library for accessing a single GPIO line on Linux platforms,
//! using either the GPIO character device or the legacy sysfs interface.
//!
//! Lines on a GPIO character device are accessed with a [`CdevLine`], which
//! talks to the kernel using whichever uAPI ABI version the kernel supports.
//!
//! Lines exported through `/sys/class/gpio` are accessed with a [`SysfsLine`].
//!
//! Both are wrapped by [`Line`], which implements the backend agnostic [`Gpio`]
//! trait, and several lines can be waited on at once using [`poll_multiple`].
//!
//! To request and read a basic input line:
//! ```no_run
//! # use gpioline::Result;
//! use gpioline::{CdevLine, Direction};
//!
//! # fn main() -> Result<()> {
//! let l3 = CdevLine::open("/dev/gpiochip0", 3, Direction::In)?;
//! let value = l3.read()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`poll_multiple`]: poll::poll_multiple

use errno::Errno;
use gpioline_uapi as uapi;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Selection of the uAPI ABI version and backend.
pub mod abi;

/// Types and functions specific to GPIO character device chips.
pub mod chip;

/// Line sessions on a GPIO character device.
///
/// The [`Builder`] creates the [`CdevLine`], which can access and reconfigure
/// a single line and return its edge events.
///
/// [`Builder`]: cdev::Builder
/// [`CdevLine`]: cdev::CdevLine
pub mod cdev;

mod gpio;
pub use gpio::{Gpio, Line};

/// Types describing lines and their configuration.
pub mod line;

/// Waiting on several lines at once.
pub mod poll;

/// Line sessions on the legacy sysfs GPIO interface.
pub mod sysfs;

pub use cdev::CdevLine;
pub use chip::{resolve_line, Chip};
pub use line::{Bias, Config, Direction, Drive, Edge, EdgeEvent, EdgeKind, LineId, Offset};
pub use sysfs::SysfsLine;

/// The uAPI ABI versions available to interact with the kernel.
///
/// Two versions of the Linux GPIO uAPI ABI currently exist, with v1 being released in
/// Linux v4.8 and v2 being released in Linux v5.10.
///
/// * `V2` is the current ABI and is used whenever the kernel supports it.
/// * `V1` is more restrictive than V2, but is available on older kernels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AbiVersion {
    V1,
    #[default]
    V2,
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiVersion::V1 => write!(f, "uAPI ABI v1"),
            AbiVersion::V2 => write!(f, "uAPI ABI v2"),
        }
    }
}

/// Errors returned by [`gpioline`] functions.
///
/// [`gpioline`]: crate
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An error returned when there is a problem with an argument.
    #[error("{0}")]
    InvalidArgument(String),

    /// An error returned from an underlying os call.
    #[error("{action}: {errno}")]
    Os {
        /// What was being attempted.
        action: Action,
        /// The error reported by the kernel.
        errno: Errno,
    },

    /// An error returned from an underlying uAPI call.
    #[error("{action}: {source}")]
    Uapi {
        /// What was being attempted.
        action: Action,
        /// The error reported by the uAPI layer.
        source: uapi::Error,
    },

    /// The kernel returned content that could not be interpreted.
    #[error("unexpected value: {0}")]
    UnexpectedValue(String),

    /// No line with the given name exists on the chip.
    #[error("line \"{name}\" not found on {}", chip.display())]
    LineNotFound {
        /// The chip that was searched.
        chip: PathBuf,
        /// The name searched for.
        name: String,
    },

    /// A bounded wait expired.
    #[error("{0}: timed out")]
    Timeout(String),

    /// The backend does not support the operation.
    #[error("{0} is not supported by {1}")]
    Unsupported(&'static str, &'static str),

    /// The operation is not valid in the current line state.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// An operation cannot be performed due to a limitation in the ABI version or kernel.
    #[error("{0} {1}")]
    AbiLimitation(AbiVersion, String),
}

impl Error {
    /// The category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::Argument,
            Error::Os { .. } | Error::Uapi { .. } | Error::UnexpectedValue(_) => ErrorKind::Io,
            Error::LineNotFound { .. } => ErrorKind::Lookup,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Unsupported(..) | Error::InvalidOperation(_) | Error::AbiLimitation(..) => {
                ErrorKind::Unsupported
            }
        }
    }

    pub(crate) fn from_io(action: Action, e: io::Error) -> Error {
        Error::Os {
            action,
            errno: Errno(e.raw_os_error().unwrap_or(libc::EIO)),
        }
    }

    pub(crate) fn from_errno(action: Action) -> Error {
        Error::Os {
            action,
            errno: errno::errno(),
        }
    }

    pub(crate) fn uapi(action: Action) -> impl FnOnce(uapi::Error) -> Error {
        move |source| Error::Uapi { action, source }
    }
}

/// The broad categories of [`Error`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A caller supplied value was out of range.
    Argument,

    /// A system call failed or returned unexpected content.
    Io,

    /// A named line could not be found.
    Lookup,

    /// A bounded wait expired.
    Timeout,

    /// The operation is not available for the line, backend or kernel.
    Unsupported,
}

/// The operation being performed when a system call failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    OpenChip,
    QueryChipInfo,
    QueryLineInfo,
    RequestLine,
    GetValue,
    SetValue,
    ReadEvent,
    Poll,
    Export,
    Unexport,
    OpenValue,
    Rewind,
    ReadAttr(&'static str),
    WriteAttr(&'static str),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenChip => write!(f, "opening GPIO chip"),
            Action::QueryChipInfo => write!(f, "querying GPIO chip info"),
            Action::QueryLineInfo => write!(f, "querying GPIO line info"),
            Action::RequestLine => write!(f, "requesting GPIO line"),
            Action::GetValue => write!(f, "getting line value"),
            Action::SetValue => write!(f, "setting line value"),
            Action::ReadEvent => write!(f, "reading GPIO event"),
            Action::Poll => write!(f, "polling GPIO"),
            Action::Export => write!(f, "exporting GPIO"),
            Action::Unexport => write!(f, "unexporting GPIO"),
            Action::OpenValue => write!(f, "opening GPIO value"),
            Action::Rewind => write!(f, "rewinding GPIO"),
            Action::ReadAttr(attr) => write!(f, "getting GPIO {attr}"),
            Action::WriteAttr(attr) => write!(f, "setting GPIO {attr}"),
        }
    }
}

/// The result for [`gpioline`] functions.
///
/// [`gpioline`]: crate
pub type Result<T> = std::result::Result<T, Error>;
