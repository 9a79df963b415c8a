// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::chip::Chip;
use crate::gpio::or_error;
use crate::line::{Bias, Config, Direction, Drive, Edge, EdgeEvent, LineId, Offset};
use crate::poll::{self, Pollable};
use crate::{abi, AbiVersion, Action, Error, Result};
use gpioline_uapi::{v1, v2};
use std::fmt;
use std::fs::File;
use std::mem;
use std::os::unix::prelude::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A builder of [`CdevLine`] sessions.
///
/// Start with [`CdevLine::builder`], apply any non-default settings, then [`open`] the line.
///
/// # Examples
///```no_run
/// # fn example() -> gpioline::Result<()> {
/// use gpioline::{CdevLine, Direction, Edge, Bias};
///
/// let button = CdevLine::builder("/dev/gpiochip0", "BUTTON", Direction::In)
///     .with_edge(Edge::Falling)
///     .with_bias(Bias::PullUp)
///     .as_inverted()
///     .with_label("doorbell")
///     .open()?;
/// # Ok(())
/// # }
///```
///
/// [`open`]: Builder::open
#[derive(Clone, Debug)]
pub struct Builder {
    chip_path: PathBuf,
    line: LineId,
    cfg: Config,
    abiv: Option<AbiVersion>,
}

impl Builder {
    /// Enable edge detection on the line.
    ///
    /// Only valid for input lines.
    pub fn with_edge(&mut self, edge: Edge) -> &mut Self {
        self.cfg.edge = edge;
        self
    }

    /// Set the bias of the line.
    pub fn with_bias(&mut self, bias: Bias) -> &mut Self {
        self.cfg.bias = bias;
        self
    }

    /// Set the drive policy of the line.
    ///
    /// Only valid for output lines.
    pub fn with_drive(&mut self, drive: Drive) -> &mut Self {
        self.cfg.drive = drive;
        self
    }

    /// Set the line to be active low.
    pub fn as_inverted(&mut self) -> &mut Self {
        self.cfg.inverted = true;
        self
    }

    /// Set whether the line is active low.
    pub fn with_inverted(&mut self, inverted: bool) -> &mut Self {
        self.cfg.inverted = inverted;
        self
    }

    /// Set the consumer label reported for the line.
    ///
    /// Labels longer than 31 bytes are truncated by the kernel.
    pub fn with_label<S: Into<String>>(&mut self, label: S) -> &mut Self {
        self.cfg.label = label.into();
        self
    }

    /// Use a particular uAPI ABI version rather than the one selected for the running kernel.
    pub fn using_abi_version(&mut self, abiv: AbiVersion) -> &mut Self {
        self.abiv = Some(abiv);
        self
    }

    /// Replace the line configuration.
    pub fn with_config(&mut self, cfg: Config) -> &mut Self {
        self.cfg = cfg;
        self
    }

    /// The configuration the line will be requested with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Open the chip and request the line.
    pub fn open(&self) -> Result<CdevLine> {
        self.cfg.validate()?;
        let mut chip = Chip::from_path(&self.chip_path)?;
        if let Some(abiv) = self.abiv {
            chip.using_abi_version(abiv);
        }
        let abiv = chip.abi_version();
        abi::check_bias(abiv, abi::kernel_version(), self.cfg.bias)?;
        let offset = match &self.line {
            LineId::Offset(offset) => *offset,
            LineId::Name(name) => chip.find_line(name)?,
        };
        let req = request(&chip, offset, &self.cfg)?;
        let mut cfg = self.cfg.clone();
        cfg.direction = cfg.direction.settled();
        tracing::debug!(
            chip = %self.chip_path.display(),
            offset,
            abi = %abiv,
            direction = %cfg.direction,
            edge = %cfg.edge,
            "requested line"
        );
        Ok(CdevLine {
            chip_path: self.chip_path.clone(),
            chip: Some(chip),
            offset,
            abiv,
            cfg,
            req: Some(req),
        })
    }
}

// Request the line from the chip using the full configuration.
fn request(chip: &Chip, offset: Offset, cfg: &Config) -> Result<File> {
    match chip.abi_version() {
        AbiVersion::V1 => {
            let handleflags = cfg.v1_handle_flags();
            if cfg.edge != Edge::None {
                let er = v1::EventRequest {
                    offset,
                    handleflags,
                    eventflags: cfg.v1_event_flags(),
                    consumer: cfg.label.as_str().into(),
                    ..Default::default()
                };
                v1::get_line_event(&chip.f, er)
            } else {
                let mut hr = v1::HandleRequest {
                    num_lines: 1,
                    flags: handleflags,
                    consumer: cfg.label.as_str().into(),
                    ..Default::default()
                };
                hr.offsets.set(0, offset);
                if cfg.direction.is_output() {
                    hr.values.set(0, cfg.initial_value() as u8);
                }
                v1::get_line_handle(&chip.f, hr)
            }
        }
        AbiVersion::V2 => {
            let mut lr = v2::LineRequest {
                num_lines: 1,
                consumer: cfg.label.as_str().into(),
                config: v2::LineConfig {
                    flags: cfg.v2_flags(),
                    ..Default::default()
                },
                ..Default::default()
            };
            lr.offsets.set(0, offset);
            if cfg.direction.is_output() {
                let mut values = v2::LineValues::default();
                values.set(0, cfg.initial_value());
                lr.config.add_values(&values);
            }
            v2::get_line(&chip.f, lr)
        }
    }
    .map_err(Error::uapi(Action::RequestLine))
}

/// A single line requested from a GPIO character device.
///
/// The session holds the chip open for its lifetime, and releases both the
/// line and the chip when closed or dropped.
///
/// Reconfiguring the line, through any of the `set_` mutators, releases and
/// re-requests the line.  That is not atomic, so the line is briefly
/// released and an output is briefly undriven.
#[derive(Debug)]
pub struct CdevLine {
    chip_path: PathBuf,
    chip: Option<Chip>,
    offset: Offset,
    abiv: AbiVersion,
    cfg: Config,
    req: Option<File>,
}

impl CdevLine {
    /// Start building a line session.
    ///
    /// * `path` - The path to the GPIO character device.
    /// * `line` - The line offset, or name.
    /// * `direction` - The initial direction of the line.
    pub fn builder<P: AsRef<Path>, L: Into<LineId>>(
        path: P,
        line: L,
        direction: Direction,
    ) -> Builder {
        Builder {
            chip_path: path.as_ref().to_path_buf(),
            line: line.into(),
            cfg: Config {
                direction,
                ..Default::default()
            },
            abiv: None,
        }
    }

    /// Open a line with the default settings for the given direction.
    pub fn open<P: AsRef<Path>, L: Into<LineId>>(
        path: P,
        line: L,
        direction: Direction,
    ) -> Result<CdevLine> {
        CdevLine::builder(path, line, direction).open()
    }

    fn line_file(&self) -> Result<&File> {
        self.req
            .as_ref()
            .ok_or(Error::InvalidOperation("line is not requested"))
    }

    fn chip(&self) -> Result<&Chip> {
        self.chip
            .as_ref()
            .ok_or(Error::InvalidOperation("line is closed"))
    }

    /// Read the logical value of the line.
    pub fn read(&self) -> Result<bool> {
        let lf = self.line_file()?;
        match self.abiv {
            AbiVersion::V1 => {
                let mut values = v1::LineValues::default();
                v1::get_line_values(lf, &mut values).map_err(Error::uapi(Action::GetValue))?;
                Ok(values.get(0) != 0)
            }
            AbiVersion::V2 => {
                let mut values = v2::LineValues { bits: 0, mask: 1 };
                v2::get_line_values(lf, &mut values).map_err(Error::uapi(Action::GetValue))?;
                Ok(values.bits & 1 == 1)
            }
        }
    }

    /// Set the logical value of an output line.
    pub fn write(&self, value: bool) -> Result<()> {
        let lf = self.line_file()?;
        if !self.cfg.direction.is_output() {
            return Err(Error::InvalidOperation("cannot write to input GPIO"));
        }
        match self.abiv {
            AbiVersion::V1 => v1::set_line_values(lf, &v1::LineValues::from_slice(&[value as u8])),
            AbiVersion::V2 => {
                let mut values = v2::LineValues::default();
                values.set(0, value);
                v2::set_line_values(lf, &values)
            }
        }
        .map_err(Error::uapi(Action::SetValue))
    }

    /// Wait for an edge event to be available on an input line.
    ///
    /// A `timeout` of None blocks indefinitely, while a zero duration returns immediately.
    ///
    /// Returns true if an event is available to [`read_event`](CdevLine::read_event).
    pub fn poll(&self, timeout: Option<Duration>) -> Result<bool> {
        let lf = self.line_file()?;
        if self.cfg.direction.is_output() {
            return Err(Error::InvalidOperation("cannot poll output GPIO"));
        }
        poll::poll_one(
            lf.as_fd(),
            libc::POLLIN | libc::POLLPRI | libc::POLLERR,
            timeout,
        )
    }

    /// Read an edge event from the line.
    ///
    /// Blocks until an event is available.
    pub fn read_event(&self) -> Result<EdgeEvent> {
        let lf = self.line_file()?;
        if self.cfg.direction.is_output() {
            return Err(Error::InvalidOperation("cannot read event of output GPIO"));
        }
        if self.cfg.edge == Edge::None {
            return Err(Error::InvalidOperation("GPIO edge not set"));
        }
        // sized for the larger v2 event, and sliced down for v1.
        let mut bbuf = [0_u64; mem::size_of::<v2::LineEdgeEvent>() / 8];
        let evt = match self.abiv {
            AbiVersion::V1 => {
                let buf = &mut bbuf[..v1::LineEdgeEvent::u64_size()];
                let n = gpioline_uapi::read_event(lf, buf)
                    .map_err(Error::uapi(Action::ReadEvent))?;
                v1::LineEdgeEvent::from_slice(&buf[..n])
                    .map(EdgeEvent::from)
                    .map_err(Error::uapi(Action::ReadEvent))?
            }
            AbiVersion::V2 => {
                let n = gpioline_uapi::read_event(lf, &mut bbuf)
                    .map_err(Error::uapi(Action::ReadEvent))?;
                v2::LineEdgeEvent::from_slice(&bbuf[..n])
                    .map(EdgeEvent::from)
                    .map_err(Error::uapi(Action::ReadEvent))?
            }
        };
        tracing::trace!(offset = self.offset, kind = %evt.kind, ts = evt.timestamp_ns, "edge event");
        Ok(evt)
    }

    fn reconfigure(&mut self, cfg: Config) -> Result<()> {
        self.reconfigure_with(cfg, request)
    }

    // Release the line and request it again with the new configuration.
    //
    // Restores the previous request if the new one is rejected.
    fn reconfigure_with<F>(&mut self, cfg: Config, request: F) -> Result<()>
    where
        F: Fn(&Chip, Offset, &Config) -> Result<File>,
    {
        if cfg == self.cfg && self.req.is_some() {
            return Ok(());
        }
        let chip = self
            .chip
            .as_ref()
            .ok_or(Error::InvalidOperation("line is closed"))?;
        self.req = None;
        match request(chip, self.offset, &cfg) {
            Ok(req) => {
                self.req = Some(req);
                self.cfg = Config {
                    direction: cfg.direction.settled(),
                    ..cfg
                };
                tracing::debug!(
                    offset = self.offset,
                    direction = %self.cfg.direction,
                    edge = %self.cfg.edge,
                    bias = %self.cfg.bias,
                    drive = %self.cfg.drive,
                    inverted = self.cfg.inverted,
                    "reconfigured line"
                );
                Ok(())
            }
            Err(e) => {
                match request(chip, self.offset, &self.cfg) {
                    Ok(req) => self.req = Some(req),
                    Err(re) => {
                        tracing::warn!(offset = self.offset, error = %re, "line left released")
                    }
                }
                Err(e)
            }
        }
    }

    /// Close the session, releasing the line and then the chip.
    ///
    /// Closing an already closed session does nothing.
    pub fn close(&mut self) {
        if self.chip.is_none() {
            return;
        }
        self.req = None;
        self.chip = None;
        self.cfg.direction = Direction::In;
        self.cfg.edge = Edge::None;
        tracing::debug!(offset = self.offset, "closed line");
    }

    /// The offset of the line on the chip.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// The path of the chip the line was requested from.
    pub fn chip_path(&self) -> &Path {
        &self.chip_path
    }

    /// The descriptor of the line request, if requested.
    pub fn fd(&self) -> Option<BorrowedFd<'_>> {
        self.req.as_ref().map(|f| f.as_fd())
    }

    /// The descriptor of the chip, if open.
    pub fn chip_fd(&self) -> Option<BorrowedFd<'_>> {
        self.chip.as_ref().map(|c| c.as_fd())
    }

    /// The uAPI ABI version used to request the line.
    pub fn abi_version(&self) -> AbiVersion {
        self.abiv
    }

    /// The current configuration of the line.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The configured direction of the line.
    ///
    /// Requested levels settle to [`Direction::Out`].
    pub fn direction(&self) -> Direction {
        self.cfg.direction
    }

    /// Change the direction of the line.
    ///
    /// Re-requests the line.  Edge detection is disabled, and the drive
    /// policy is reset when switching to input.
    pub fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if direction == self.cfg.direction {
            return Ok(());
        }
        let mut cfg = self.cfg.clone();
        cfg.direction = direction;
        cfg.edge = Edge::None;
        if !direction.is_output() {
            cfg.drive = Drive::Default;
        }
        self.reconfigure(cfg)
    }

    /// The configured edge detection.
    pub fn edge(&self) -> Edge {
        self.cfg.edge
    }

    /// Change the edge detection of an input line.  Re-requests the line.
    pub fn set_edge(&mut self, edge: Edge) -> Result<()> {
        if self.cfg.direction.is_output() {
            return Err(Error::InvalidOperation("cannot set edge on output GPIO"));
        }
        if edge == self.cfg.edge {
            return Ok(());
        }
        let mut cfg = self.cfg.clone();
        cfg.edge = edge;
        self.reconfigure(cfg)
    }

    /// The configured bias.
    pub fn bias(&self) -> Bias {
        self.cfg.bias
    }

    /// Change the bias of the line.  Re-requests the line.
    pub fn set_bias(&mut self, bias: Bias) -> Result<()> {
        if bias == self.cfg.bias {
            return Ok(());
        }
        abi::check_bias(self.abiv, abi::kernel_version(), bias)?;
        let mut cfg = self.cfg.clone();
        cfg.bias = bias;
        self.reconfigure(cfg)
    }

    /// The configured drive policy.
    pub fn drive(&self) -> Drive {
        self.cfg.drive
    }

    /// Change the drive policy of an output line.  Re-requests the line.
    pub fn set_drive(&mut self, drive: Drive) -> Result<()> {
        if drive != Drive::Default && !self.cfg.direction.is_output() {
            return Err(Error::InvalidOperation(
                "cannot set line drive on input GPIO",
            ));
        }
        if drive == self.cfg.drive {
            return Ok(());
        }
        let mut cfg = self.cfg.clone();
        cfg.drive = drive;
        self.reconfigure(cfg)
    }

    /// True if the line is active low.
    pub fn inverted(&self) -> bool {
        self.cfg.inverted
    }

    /// Change the polarity of the line.  Re-requests the line.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        if inverted == self.cfg.inverted {
            return Ok(());
        }
        let mut cfg = self.cfg.clone();
        cfg.inverted = inverted;
        self.reconfigure(cfg)
    }

    /// The name of the line, as reported by the chip.
    pub fn name(&self) -> Result<String> {
        Ok(self.chip()?.line_info(self.offset)?.name)
    }

    /// The consumer label of the line, as reported by the chip.
    pub fn label(&self) -> Result<String> {
        Ok(self.chip()?.line_info(self.offset)?.consumer)
    }

    /// The kernel name of the chip.
    pub fn chip_name(&self) -> Result<String> {
        Ok(self.chip()?.info()?.name)
    }

    /// The label of the chip.
    pub fn chip_label(&self) -> Result<String> {
        Ok(self.chip()?.info()?.label)
    }
}

impl Drop for CdevLine {
    fn drop(&mut self) {
        self.close();
    }
}

impl Pollable for CdevLine {
    fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        self.fd()
    }

    fn poll_events(&self) -> i16 {
        libc::POLLIN | libc::POLLRDNORM
    }

    fn after_wake(&mut self) -> Result<()> {
        Ok(())
    }
}

fn fd_str(fd: Option<BorrowedFd<'_>>) -> String {
    match fd {
        Some(fd) => fd.as_raw_fd().to_string(),
        None => "-1".to_string(),
    }
}

impl fmt::Display for CdevLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GPIO {} (name=\"{}\", label=\"{}\", device={}, line_fd={}, chip_fd={}, \
             direction={}, edge={}, bias={}, drive={}, inverted={}, \
             chip_name=\"{}\", chip_label=\"{}\", type=cdev)",
            self.offset,
            or_error(self.name()),
            or_error(self.label()),
            self.chip_path.display(),
            fd_str(self.fd()),
            fd_str(self.chip_fd()),
            self.cfg.direction,
            self.cfg.edge,
            self.cfg.bias,
            self.cfg.drive,
            self.cfg.inverted,
            or_error(self.chip_name()),
            or_error(self.chip_label()),
        )
    }
}
