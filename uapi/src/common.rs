// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use errno::Errno;
use std::ffi::OsStr;
use std::fs::File;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;

pub(crate) const IOCTL_MAGIC: u8 = 0xb4;

macro_rules! ior {
    ($nr:expr, $ty:ty) => {
        nix::request_code_read!(
            $crate::common::IOCTL_MAGIC,
            $nr,
            ::std::mem::size_of::<$ty>()
        )
    };
}

macro_rules! iorw {
    ($nr:expr, $ty:ty) => {
        nix::request_code_readwrite!(
            $crate::common::IOCTL_MAGIC,
            $nr,
            ::std::mem::size_of::<$ty>()
        )
    };
}

#[repr(u8)]
enum Ioctl {
    GetChipInfo = 1,
}

/// The kernel's description of a chip.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChipInfo {
    /// The Linux kernel name of this GPIO chip.
    pub name: Name,

    /// A functional name for this GPIO chip, such as a product number.
    ///
    /// May be empty.
    pub label: Name,

    /// The number of GPIO lines on this chip.
    pub num_lines: u32,
}

/// Get the publicly available information for a chip.
///
/// * `cf` - The chip file.
pub fn get_chip_info(cf: &File) -> Result<ChipInfo> {
    let mut chip = ChipInfo::default();
    // SAFETY: returned struct contains raw byte arrays and ints that are safe to decode.
    match unsafe {
        libc::ioctl(
            cf.as_raw_fd(),
            ior!(Ioctl::GetChipInfo, ChipInfo),
            &mut chip,
        )
    } {
        0 => Ok(chip),
        _ => Err(Error::from_errno()),
    }
}

/// Check if the file has an event available to read without blocking.
///
/// The kernel flags pending edge events as readable on a line request file.
pub fn has_event(f: &File) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd: f.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: pfd is a single valid pollfd for the duration of the call.
    match unsafe { libc::poll(&mut pfd, 1, 0) } {
        -1 => Err(Error::from_errno()),
        0 => Ok(false),
        _ => Ok(true),
    }
}

/// Read an event from a chip or line request file.
///
/// Returns the number of u64 words read into the buffer.
/// Blocks until an event is available.
///
/// * `f` - The file to read from.
/// * `buf` - The buffer to hold the event(s).  Must be sized in multiples of the event size.
pub fn read_event(f: &File, buf: &mut [u64]) -> Result<usize> {
    // SAFETY: the buffer is valid for buf.len()*8 bytes for the duration of the read.
    match unsafe {
        libc::read(
            f.as_raw_fd(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len() * 8,
        )
    } {
        -1 => Err(Error::from_errno()),
        x => {
            let size = x as usize;
            if size % 8 == 0 {
                Ok(size / 8)
            } else {
                Err(Error::from(UnderReadError::new(
                    "read_event",
                    buf.len() * 8,
                    size,
                )))
            }
        }
    }
}

/// The result returned by [`gpioline_uapi`] functions.
///
/// [`gpioline_uapi`]: crate
pub type Result<T> = std::result::Result<T, Error>;

/// Result returned by struct validators.
pub(crate) type ValidationResult = std::result::Result<(), ValidationError>;

/// Errors returned by [`gpioline_uapi`] functions.
///
/// [`gpioline_uapi`]: crate
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum Error {
    /// An error returned from an underlying system call.
    #[error(transparent)]
    Os(Errno),

    /// An error indicating insufficient data read for the expected object.
    #[error(transparent)]
    UnderRead(#[from] UnderReadError),

    /// An error validating an data structure retuned from the kernel
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Create an error from the current errno value.
    #[inline]
    pub fn from_errno() -> Error {
        Error::Os(errno::errno())
    }
}

/// A failure to read sufficient bytes to construct an object.
//
// This should never happen - but is checked to be safe.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
#[error("Reading {obj} returned {found} bytes, expected {expected}.")]
pub struct UnderReadError {
    /// The struct being read
    pub obj: &'static str,
    /// The number of bytes expected.
    pub expected: usize,
    /// The number of bytes read.
    pub found: usize,
}

impl UnderReadError {
    /// Create an UnderReadError.
    pub(crate) fn new(obj: &'static str, expected: usize, found: usize) -> UnderReadError {
        UnderReadError {
            obj,
            expected,
            found,
        }
    }
}

/// A failure to validate a struct returned from a system call.
//
// Should only be seen if a kernel update adds an enum value we are unaware of.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
#[error("Kernel returned invalid {field}: {msg}")]
pub struct ValidationError {
    /// The field that failed to validate.
    pub field: String,
    /// The details of the validation failure.
    pub msg: String,
}

impl ValidationError {
    pub(crate) fn new<S: Into<String>, T: Into<String>>(field: S, msg: T) -> ValidationError {
        ValidationError {
            field: field.into(),
            msg: msg.into(),
        }
    }
}

/// The maximum number of bytes stored in a Name.
pub const NAME_MAX: usize = 32;

/// A uAPI name string, common to ABI v1 and v2.
///
/// Names are NUL padded and are not NUL terminated if they fill the array.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Name([u8; NAME_MAX]);

impl Name {
    /// Checks whether the Name is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// The length of the contained name.
    #[inline]
    pub fn strlen(&self) -> usize {
        self.0.iter().position(|&x| x == 0).unwrap_or(self.0.len())
    }

    /// Convert the contained name to a OsStr slice.
    pub fn as_os_str(&self) -> &OsStr {
        OsStr::from_bytes(&self.0[..self.strlen()])
    }

    /// Construct a Name from byte slice.
    ///
    /// Input longer than [`NAME_MAX`] is truncated, which may result in
    /// invalid UTF-8 if cut in the middle of a multi-byte character.
    pub fn from_bytes(s: &[u8]) -> Name {
        let mut d: Name = Default::default();
        for (src, dst) in s.iter().zip(d.0.iter_mut()) {
            *dst = *src;
        }
        d
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::from_bytes(s.as_bytes())
    }
}

impl From<&Name> for String {
    fn from(s: &Name) -> Self {
        String::from(s.as_os_str().to_string_lossy())
    }
}

/// An identifier for a line on a particular chip.
///
/// Valid offsets are in the range 0..`num_lines` as reported in the [`ChipInfo`].
pub type Offset = u32;

/// The maximum number of lines that may be requested in a single request.
pub const LINES_MAX: usize = 64;

/// A collection of line offsets.
#[repr(C)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offsets([Offset; LINES_MAX]);

impl Offsets {
    /// Create offsets from a slice.
    pub fn from_slice(s: &[u32]) -> Self {
        let mut n: Offsets = Default::default();
        for (src, dst) in s.iter().zip(n.0.iter_mut()) {
            *dst = *src;
        }
        n
    }

    /// Get the indexed offset from the set.
    #[inline]
    pub fn get(&self, idx: usize) -> Offset {
        self.0[idx]
    }

    /// Set the indexed offset in the set.
    #[inline]
    pub fn set(&mut self, idx: usize, offset: Offset) {
        self.0[idx] = offset;
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Offsets([0; LINES_MAX])
    }
}

/// Space reserved for future use.
///
/// Sized in multiples of u32 words.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[doc(hidden)]
pub struct Padding<const SIZE: usize>([u32; SIZE]);

impl<const SIZE: usize> Default for Padding<SIZE> {
    fn default() -> Self {
        Padding([0; SIZE])
    }
}

impl<const SIZE: usize> Padding<SIZE> {
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|x| *x == 0)
    }
}

/// The trigger identifier for a line edge event.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineEdgeEventKind {
    /// Indicates the line transitioned from *inactive* to *active*.
    RisingEdge = 1,

    /// Indicates the line transitioned from *active* to *inactive*.
    FallingEdge = 2,
}

impl TryFrom<u32> for LineEdgeEventKind {
    type Error = String;

    fn try_from(v: u32) -> std::result::Result<Self, Self::Error> {
        use LineEdgeEventKind::*;
        Ok(match v {
            x if x == RisingEdge as u32 => RisingEdge,
            x if x == FallingEdge as u32 => FallingEdge,
            x => return Err(format!("invalid value: {x}")),
        })
    }
}

impl LineEdgeEventKind {
    /// Confirm that the value read from the kernel is valid in Rust.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        LineEdgeEventKind::try_from(*self as u32).map(|_i| ())
    }
}
