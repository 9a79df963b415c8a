// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::gpio::or_error;
use crate::line::{Bias, Direction, Drive, Edge, EdgeEvent, Offset};
use crate::poll::{self, Pollable};
use crate::{Action, Error, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::prelude::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// The default mount point of the sysfs GPIO class.
pub const SYSFS_ROOT: &str = "/sys/class/gpio";

const BACKEND: &str = "sysfs GPIO";

/// How long to wait for an exported line to become usable.
///
/// Exporting is asynchronous, as are the udev rules that typically fix up
/// permissions on the exported attributes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// The number of checks made before giving up.
    pub attempts: u32,

    /// The delay between checks.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 10,
            delay: Duration::from_millis(100),
        }
    }
}

/// A builder of [`SysfsLine`] sessions.
#[derive(Clone, Debug)]
pub struct Builder {
    root: PathBuf,
    offset: Offset,
    direction: Direction,
    retry: RetryPolicy,
}

impl Builder {
    /// Use a sysfs GPIO class mounted somewhere other than `/sys/class/gpio`.
    pub fn with_root<P: AsRef<Path>>(&mut self, root: P) -> &mut Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    /// Set how long to wait for an exported line to become usable.
    pub fn with_retry(&mut self, retry: RetryPolicy) -> &mut Self {
        self.retry = retry;
        self
    }

    /// Export the line, if necessary, and open its value.
    pub fn open(&self) -> Result<SysfsLine> {
        let path = self.root.join(format!("gpio{}", self.offset));
        let mut exported = false;
        if !path.is_dir() {
            self.export(&path)?;
            exported = true;
        }
        let value = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.join("value"))
            .map_err(|e| Error::from_io(Action::OpenValue, e))?;
        let line = SysfsLine {
            root: self.root.clone(),
            path,
            offset: self.offset,
            value: Some(value),
            exported,
        };
        if line.direction_token()? != self.direction.to_string() {
            line.write_attr("direction", &self.direction.to_string())?;
        }
        tracing::debug!(
            path = %line.path.display(),
            exported,
            direction = %self.direction,
            "opened sysfs line"
        );
        Ok(line)
    }

    fn export(&self, path: &Path) -> Result<()> {
        fs::write(self.root.join("export"), format!("{}\n", self.offset))
            .map_err(|e| Error::from_io(Action::Export, e))?;
        tracing::debug!(offset = self.offset, "exported sysfs line");

        let mut attempt = 0;
        while !path.is_dir() {
            attempt += 1;
            if attempt >= self.retry.attempts {
                return Err(Error::Timeout(format!(
                    "exporting GPIO: waiting for \"{}\"",
                    path.display()
                )));
            }
            thread::sleep(self.retry.delay);
        }

        // permissions are applied asynchronously after export
        let direction = path.join("direction");
        for attempt in 1..=self.retry.attempts {
            match OpenOptions::new().write(true).open(&direction) {
                Ok(_) => break,
                Err(e)
                    if e.raw_os_error() == Some(libc::EACCES)
                        && attempt < self.retry.attempts =>
                {
                    thread::sleep(self.retry.delay)
                }
                Err(e) => return Err(Error::from_io(Action::WriteAttr("direction"), e)),
            }
        }
        Ok(())
    }
}

/// A single line exported through the sysfs GPIO interface.
///
/// Lines are identified by their global GPIO number.
/// A line exported by the session is unexported when the session is closed
/// or dropped.  A line that was already exported is left exported.
#[derive(Debug)]
pub struct SysfsLine {
    root: PathBuf,
    path: PathBuf,
    offset: Offset,
    value: Option<File>,
    exported: bool,
}

impl SysfsLine {
    /// Start building a line session.
    pub fn builder(offset: Offset, direction: Direction) -> Builder {
        Builder {
            root: PathBuf::from(SYSFS_ROOT),
            offset,
            direction,
            retry: RetryPolicy::default(),
        }
    }

    /// Open a line on the standard sysfs mount.
    pub fn open(offset: Offset, direction: Direction) -> Result<SysfsLine> {
        SysfsLine::builder(offset, direction).open()
    }

    fn value_file(&self) -> Result<&File> {
        self.value
            .as_ref()
            .ok_or(Error::InvalidOperation("line is closed"))
    }

    fn rewind(mut f: &File) -> Result<()> {
        f.seek(SeekFrom::Start(0))
            .map(|_| ())
            .map_err(|e| Error::from_io(Action::Rewind, e))
    }

    fn read_attr(&self, attr: &'static str) -> Result<String> {
        self.value_file()?;
        let s = fs::read_to_string(self.path.join(attr))
            .map_err(|e| Error::from_io(Action::ReadAttr(attr), e))?;
        Ok(s.trim().to_string())
    }

    fn write_attr(&self, attr: &'static str, token: &str) -> Result<()> {
        self.value_file()?;
        fs::write(self.path.join(attr), format!("{token}\n"))
            .map_err(|e| Error::from_io(Action::WriteAttr(attr), e))
    }

    fn direction_token(&self) -> Result<String> {
        self.read_attr("direction")
    }

    /// Read the logical value of the line.
    pub fn read(&self) -> Result<bool> {
        let mut f = self.value_file()?;
        let mut buf = [0_u8; 2];
        let n = f
            .read(&mut buf)
            .map_err(|e| Error::from_io(Action::GetValue, e))?;
        SysfsLine::rewind(f)?;
        match &buf[..n] {
            [b'0', ..] => Ok(false),
            [b'1', ..] => Ok(true),
            v => Err(Error::UnexpectedValue(format!(
                "GPIO value: {:?}",
                String::from_utf8_lossy(v)
            ))),
        }
    }

    /// Set the logical value of the line.
    pub fn write(&self, value: bool) -> Result<()> {
        let mut f = self.value_file()?;
        let token: &[u8] = if value { b"1\n" } else { b"0\n" };
        f.write_all(token)
            .map_err(|e| Error::from_io(Action::SetValue, e))?;
        SysfsLine::rewind(f)
    }

    /// Wait for an edge on the line, as configured by [`set_edge`](SysfsLine::set_edge).
    ///
    /// A `timeout` of None blocks indefinitely, while a zero duration returns immediately.
    /// The edge is consumed by a subsequent [`read`](SysfsLine::read).
    pub fn poll(&self, timeout: Option<Duration>) -> Result<bool> {
        let f = self.value_file()?;
        if poll::poll_one(f.as_fd(), libc::POLLPRI | libc::POLLERR, timeout)? {
            SysfsLine::rewind(f)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Close the value and unexport the line, if it was exported by this session.
    ///
    /// Closing an already closed session does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.value.take().is_none() {
            return Ok(());
        }
        if self.exported {
            self.exported = false;
            fs::write(self.root.join("unexport"), format!("{}\n", self.offset))
                .map_err(|e| Error::from_io(Action::Unexport, e))?;
            tracing::debug!(offset = self.offset, "unexported sysfs line");
        }
        Ok(())
    }

    /// The global number of the line.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// The path of the line's sysfs directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The descriptor of the open value attribute.
    pub fn fd(&self) -> Option<BorrowedFd<'_>> {
        self.value.as_ref().map(|f| f.as_fd())
    }

    /// True if the line was exported by this session.
    pub fn exported(&self) -> bool {
        self.exported
    }

    /// The current direction of the line, `In` or `Out`.
    pub fn direction(&self) -> Result<Direction> {
        let token = self.direction_token()?;
        match token.as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            _ => Err(Error::UnexpectedValue(format!("GPIO direction: {token:?}"))),
        }
    }

    /// Change the direction of the line.
    pub fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.write_attr("direction", &direction.to_string())
    }

    /// The edges currently reported by [`poll`](SysfsLine::poll).
    pub fn edge(&self) -> Result<Edge> {
        let token = self.read_attr("edge")?;
        token
            .parse()
            .map_err(|_| Error::UnexpectedValue(format!("GPIO edge: {token:?}")))
    }

    /// Change the edges reported by [`poll`](SysfsLine::poll).
    ///
    /// Only valid for input lines.
    pub fn set_edge(&mut self, edge: Edge) -> Result<()> {
        if self.direction()?.is_output() {
            return Err(Error::InvalidOperation("cannot set edge on output GPIO"));
        }
        self.write_attr("edge", &edge.to_string())
    }

    /// True if the line is active low.
    pub fn inverted(&self) -> Result<bool> {
        let token = self.read_attr("active_low")?;
        match token.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Error::UnexpectedValue(format!(
                "GPIO active_low: {token:?}"
            ))),
        }
    }

    /// Change the polarity of the line.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        self.write_attr("active_low", if inverted { "1" } else { "0" })
    }

    /// Always empty, as sysfs does not expose line names.
    pub fn name(&self) -> Result<String> {
        Ok(String::new())
    }

    /// Always empty, as sysfs does not expose consumer labels.
    pub fn label(&self) -> Result<String> {
        Ok(String::new())
    }

    /// The name of the chip providing the line, from the `device` link.
    pub fn chip_name(&self) -> Result<String> {
        let link = fs::read_link(self.path.join("device"))
            .map_err(|e| Error::from_io(Action::ReadAttr("device"), e))?;
        let link = link.to_string_lossy();
        match link.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(Error::UnexpectedValue(format!(
                "invalid device symlink \"{link}\""
            ))),
        }
    }

    /// The label of the chip providing the line.
    pub fn chip_label(&self) -> Result<String> {
        let path = self.root.join(self.chip_name()?).join("label");
        let label = fs::read_to_string(path)
            .map_err(|e| Error::from_io(Action::ReadAttr("label"), e))?;
        Ok(label.trim().to_string())
    }

    /// Not supported by sysfs.
    pub fn bias(&self) -> Result<Bias> {
        Err(Error::Unsupported("line bias", BACKEND))
    }

    /// Not supported by sysfs.
    pub fn set_bias(&mut self, _bias: Bias) -> Result<()> {
        Err(Error::Unsupported("line bias", BACKEND))
    }

    /// Not supported by sysfs.
    pub fn drive(&self) -> Result<Drive> {
        Err(Error::Unsupported("line drive", BACKEND))
    }

    /// Not supported by sysfs.
    pub fn set_drive(&mut self, _drive: Drive) -> Result<()> {
        Err(Error::Unsupported("line drive", BACKEND))
    }

    /// Not supported by sysfs, which reports edges without timestamps.
    ///
    /// Use [`poll`](SysfsLine::poll) and [`read`](SysfsLine::read) instead.
    pub fn read_event(&self) -> Result<EdgeEvent> {
        Err(Error::Unsupported("reading edge events", BACKEND))
    }
}

impl Drop for SysfsLine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(offset = self.offset, error = %e, "closing sysfs line");
        }
    }
}

impl Pollable for SysfsLine {
    fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        self.fd()
    }

    fn poll_events(&self) -> i16 {
        libc::POLLPRI | libc::POLLERR
    }

    fn after_wake(&mut self) -> Result<()> {
        SysfsLine::rewind(self.value_file()?)
    }
}

impl fmt::Display for SysfsLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fd = self.fd().map(|fd| fd.as_raw_fd()).unwrap_or(-1);
        write!(
            f,
            "GPIO {} (device={}, fd={}, direction={}, edge={}, inverted={}, \
             chip_name=\"{}\", chip_label=\"{}\", type=sysfs)",
            self.offset,
            self.path.display(),
            fd,
            or_error(self.direction()),
            or_error(self.edge()),
            or_error(self.inverted()),
            or_error(self.chip_name()),
            or_error(self.chip_label()),
        )
    }
}
