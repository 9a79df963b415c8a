// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::cdev::CdevLine;
use crate::line::{Bias, Direction, Drive, Edge, EdgeEvent, Offset};
use crate::poll::Pollable;
use crate::sysfs::SysfsLine;
use crate::Result;
use std::fmt;
use std::os::unix::prelude::BorrowedFd;
use std::time::Duration;

/// Render a fallible attribute for display.
pub(crate) fn or_error<T: fmt::Display>(r: Result<T>) -> String {
    match r {
        Ok(v) => v.to_string(),
        Err(_) => "<error>".to_string(),
    }
}

/// The operations common to all single line sessions.
///
/// Operations a backend cannot perform return an [`Unsupported`] error.
///
/// [`Unsupported`]: crate::ErrorKind::Unsupported
pub trait Gpio {
    /// Read the logical value of the line.
    fn read(&self) -> Result<bool>;

    /// Set the logical value of an output line.
    fn write(&self, value: bool) -> Result<()>;

    /// Wait for an edge on the line.
    ///
    /// Returns true if an edge is available before the timeout expires.
    fn poll(&self, timeout: Option<Duration>) -> Result<bool>;

    /// Read the next edge event from the line.
    fn read_event(&self) -> Result<EdgeEvent>;

    fn direction(&self) -> Result<Direction>;
    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    fn edge(&self) -> Result<Edge>;
    fn set_edge(&mut self, edge: Edge) -> Result<()>;

    fn bias(&self) -> Result<Bias>;
    fn set_bias(&mut self, bias: Bias) -> Result<()>;

    fn drive(&self) -> Result<Drive>;
    fn set_drive(&mut self, drive: Drive) -> Result<()>;

    fn inverted(&self) -> Result<bool>;
    fn set_inverted(&mut self, inverted: bool) -> Result<()>;

    /// The name of the line, as reported by the chip.
    fn name(&self) -> Result<String>;

    /// The consumer label of the line.
    fn label(&self) -> Result<String>;

    fn chip_name(&self) -> Result<String>;
    fn chip_label(&self) -> Result<String>;

    /// Release the line.
    ///
    /// Closing a closed line does nothing.
    fn close(&mut self) -> Result<()>;
}

impl Gpio for CdevLine {
    fn read(&self) -> Result<bool> {
        CdevLine::read(self)
    }

    fn write(&self, value: bool) -> Result<()> {
        CdevLine::write(self, value)
    }

    fn poll(&self, timeout: Option<Duration>) -> Result<bool> {
        CdevLine::poll(self, timeout)
    }

    fn read_event(&self) -> Result<EdgeEvent> {
        CdevLine::read_event(self)
    }

    fn direction(&self) -> Result<Direction> {
        Ok(CdevLine::direction(self))
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        CdevLine::set_direction(self, direction)
    }

    fn edge(&self) -> Result<Edge> {
        Ok(CdevLine::edge(self))
    }

    fn set_edge(&mut self, edge: Edge) -> Result<()> {
        CdevLine::set_edge(self, edge)
    }

    fn bias(&self) -> Result<Bias> {
        Ok(CdevLine::bias(self))
    }

    fn set_bias(&mut self, bias: Bias) -> Result<()> {
        CdevLine::set_bias(self, bias)
    }

    fn drive(&self) -> Result<Drive> {
        Ok(CdevLine::drive(self))
    }

    fn set_drive(&mut self, drive: Drive) -> Result<()> {
        CdevLine::set_drive(self, drive)
    }

    fn inverted(&self) -> Result<bool> {
        Ok(CdevLine::inverted(self))
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        CdevLine::set_inverted(self, inverted)
    }

    fn name(&self) -> Result<String> {
        CdevLine::name(self)
    }

    fn label(&self) -> Result<String> {
        CdevLine::label(self)
    }

    fn chip_name(&self) -> Result<String> {
        CdevLine::chip_name(self)
    }

    fn chip_label(&self) -> Result<String> {
        CdevLine::chip_label(self)
    }

    fn close(&mut self) -> Result<()> {
        CdevLine::close(self);
        Ok(())
    }
}

impl Gpio for SysfsLine {
    fn read(&self) -> Result<bool> {
        SysfsLine::read(self)
    }

    fn write(&self, value: bool) -> Result<()> {
        SysfsLine::write(self, value)
    }

    fn poll(&self, timeout: Option<Duration>) -> Result<bool> {
        SysfsLine::poll(self, timeout)
    }

    fn read_event(&self) -> Result<EdgeEvent> {
        SysfsLine::read_event(self)
    }

    fn direction(&self) -> Result<Direction> {
        SysfsLine::direction(self)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        SysfsLine::set_direction(self, direction)
    }

    fn edge(&self) -> Result<Edge> {
        SysfsLine::edge(self)
    }

    fn set_edge(&mut self, edge: Edge) -> Result<()> {
        SysfsLine::set_edge(self, edge)
    }

    fn bias(&self) -> Result<Bias> {
        SysfsLine::bias(self)
    }

    fn set_bias(&mut self, bias: Bias) -> Result<()> {
        SysfsLine::set_bias(self, bias)
    }

    fn drive(&self) -> Result<Drive> {
        SysfsLine::drive(self)
    }

    fn set_drive(&mut self, drive: Drive) -> Result<()> {
        SysfsLine::set_drive(self, drive)
    }

    fn inverted(&self) -> Result<bool> {
        SysfsLine::inverted(self)
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        SysfsLine::set_inverted(self, inverted)
    }

    fn name(&self) -> Result<String> {
        SysfsLine::name(self)
    }

    fn label(&self) -> Result<String> {
        SysfsLine::label(self)
    }

    fn chip_name(&self) -> Result<String> {
        SysfsLine::chip_name(self)
    }

    fn chip_label(&self) -> Result<String> {
        SysfsLine::chip_label(self)
    }

    fn close(&mut self) -> Result<()> {
        SysfsLine::close(self)
    }
}

/// A line session on either backend.
///
/// Returned by [`abi::open`](crate::abi::open).
#[derive(Debug)]
pub enum Line {
    /// A line requested from a GPIO character device.
    Cdev(CdevLine),

    /// A line exported through sysfs.
    Sysfs(SysfsLine),
}

impl Line {
    /// The offset of the line on its chip, or its global number for sysfs.
    pub fn offset(&self) -> Offset {
        match self {
            Line::Cdev(l) => l.offset(),
            Line::Sysfs(l) => l.offset(),
        }
    }

    fn inner(&self) -> &dyn Gpio {
        match self {
            Line::Cdev(l) => l,
            Line::Sysfs(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Gpio {
        match self {
            Line::Cdev(l) => l,
            Line::Sysfs(l) => l,
        }
    }
}

impl Gpio for Line {
    fn read(&self) -> Result<bool> {
        self.inner().read()
    }

    fn write(&self, value: bool) -> Result<()> {
        self.inner().write(value)
    }

    fn poll(&self, timeout: Option<Duration>) -> Result<bool> {
        self.inner().poll(timeout)
    }

    fn read_event(&self) -> Result<EdgeEvent> {
        self.inner().read_event()
    }

    fn direction(&self) -> Result<Direction> {
        self.inner().direction()
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.inner_mut().set_direction(direction)
    }

    fn edge(&self) -> Result<Edge> {
        self.inner().edge()
    }

    fn set_edge(&mut self, edge: Edge) -> Result<()> {
        self.inner_mut().set_edge(edge)
    }

    fn bias(&self) -> Result<Bias> {
        self.inner().bias()
    }

    fn set_bias(&mut self, bias: Bias) -> Result<()> {
        self.inner_mut().set_bias(bias)
    }

    fn drive(&self) -> Result<Drive> {
        self.inner().drive()
    }

    fn set_drive(&mut self, drive: Drive) -> Result<()> {
        self.inner_mut().set_drive(drive)
    }

    fn inverted(&self) -> Result<bool> {
        self.inner().inverted()
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        self.inner_mut().set_inverted(inverted)
    }

    fn name(&self) -> Result<String> {
        self.inner().name()
    }

    fn label(&self) -> Result<String> {
        self.inner().label()
    }

    fn chip_name(&self) -> Result<String> {
        self.inner().chip_name()
    }

    fn chip_label(&self) -> Result<String> {
        self.inner().chip_label()
    }

    fn close(&mut self) -> Result<()> {
        self.inner_mut().close()
    }
}

impl Pollable for Line {
    fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        match self {
            Line::Cdev(l) => l.poll_fd(),
            Line::Sysfs(l) => l.poll_fd(),
        }
    }

    fn poll_events(&self) -> i16 {
        match self {
            Line::Cdev(l) => l.poll_events(),
            Line::Sysfs(l) => l.poll_events(),
        }
    }

    fn after_wake(&mut self) -> Result<()> {
        match self {
            Line::Cdev(l) => l.after_wake(),
            Line::Sysfs(l) => l.after_wake(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Cdev(l) => fmt::Display::fmt(l, f),
            Line::Sysfs(l) => fmt::Display::fmt(l, f),
        }
    }
}
