// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::line::{self, Offset};
use crate::{abi, AbiVersion, Action, Error, Result};
use gpioline_uapi::{v1, v2};
use std::cell::Cell;
use std::fs;
use std::ops::Range;
use std::os::unix::prelude::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};

/// Find the offset of a named line on a chip.
///
/// The chip is opened for the duration of the search only.
/// Names are matched exactly, and the first matching line is returned.
pub fn resolve_line<P: AsRef<Path>>(chip_path: P, name: &str) -> Result<Offset> {
    Chip::from_path(chip_path)?.find_line(name)
}

/// An iterator that returns the info for each line on the [`Chip`].
pub struct LineInfoIterator<'a> {
    chip: &'a Chip,
    offsets: Range<Offset>,
}

impl<'a> Iterator for LineInfoIterator<'a> {
    type Item = Result<line::Info>;

    fn next(&mut self) -> Option<Result<line::Info>> {
        self.offsets
            .next()
            .map(|offset| self.chip.line_info(offset))
    }
}

/// A GPIO character device.
#[derive(Debug)]
pub struct Chip {
    /// The path used to open the GPIO character device.
    path: PathBuf,
    /// The open GPIO character device file.
    pub(crate) f: fs::File,
    abiv: Cell<Option<AbiVersion>>,
}

impl Chip {
    /// Constructs a Chip using the given path.
    ///
    /// # Examples
    ///```no_run
    /// # fn example() -> gpioline::Result<gpioline::Chip>{
    /// let chip = gpioline::Chip::from_path("/dev/gpiochip0")?;
    /// # Ok(chip)
    /// # }
    ///```
    pub fn from_path<P: AsRef<Path>>(p: P) -> Result<Chip> {
        let path = p.as_ref().to_path_buf();
        let f = fs::File::open(&path).map_err(|e| Error::from_io(Action::OpenChip, e))?;
        Ok(Chip {
            path,
            f,
            abiv: Default::default(),
        })
    }

    /// Get the information for the chip.
    pub fn info(&self) -> Result<Info> {
        Ok(Info::from(
            gpioline_uapi::get_chip_info(&self.f).map_err(Error::uapi(Action::QueryChipInfo))?,
        ))
    }

    /// Return the path of the chip.
    pub fn path(&self) -> &Path {
        self.path.as_ref()
    }

    /// The ABI version used for uAPI operations on the chip.
    ///
    /// Selected from the running kernel unless set by [`using_abi_version`].
    ///
    /// [`using_abi_version`]: Chip::using_abi_version
    pub fn abi_version(&self) -> AbiVersion {
        match self.abiv.get() {
            Some(abiv) => abiv,
            None => {
                let abiv = abi::select_abi_version();
                self.abiv.set(Some(abiv));
                abiv
            }
        }
    }

    /// Set the ABI version to use for subsequent operations.
    pub fn using_abi_version(&mut self, abiv: AbiVersion) -> &mut Self {
        self.abiv.set(Some(abiv));
        self
    }

    /// Find the offset of the named line.
    ///
    /// Returns the first matching line.
    pub fn find_line(&self, name: &str) -> Result<Offset> {
        for info in self.line_info_iter()? {
            let info = info?;
            if info.name == name {
                return Ok(info.offset);
            }
        }
        Err(Error::LineNotFound {
            chip: self.path.clone(),
            name: name.to_string(),
        })
    }

    /// Get the information for a line on the chip.
    pub fn line_info(&self, offset: Offset) -> Result<line::Info> {
        match self.abi_version() {
            AbiVersion::V1 => v1::get_line_info(&self.f, offset).map(|li| line::Info::from(&li)),
            AbiVersion::V2 => v2::get_line_info(&self.f, offset).map(|li| line::Info::from(&li)),
        }
        .map_err(Error::uapi(Action::QueryLineInfo))
    }

    /// An iterator that returns the info for each line on the chip.
    pub fn line_info_iter(&self) -> Result<LineInfoIterator> {
        let cinfo = self.info()?;
        Ok(LineInfoIterator {
            chip: self,
            offsets: Range {
                start: 0,
                end: cinfo.num_lines,
            },
        })
    }
}

impl AsFd for Chip {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.f.as_fd()
    }
}

impl AsRawFd for Chip {
    #[inline]
    fn as_raw_fd(&self) -> i32 {
        self.f.as_raw_fd()
    }
}

/// The publicly available information for a GPIO chip.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Info {
    /// The system name for the chip, such as "*gpiochip0*".
    pub name: String,

    /// A functional name for the chip.
    ///
    /// This typically identifies the type of GPIO chip.
    pub label: String,

    /// The number of lines provided by the chip.
    pub num_lines: u32,
}

impl From<gpioline_uapi::ChipInfo> for Info {
    fn from(ci: gpioline_uapi::ChipInfo) -> Self {
        Info {
            name: String::from(&ci.name),
            label: String::from(&ci.label),
            num_lines: ci.num_lines,
        }
    }
}
