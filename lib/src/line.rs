// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Error, Result};
use gpioline_uapi::{v1, v2, LineEdgeEventKind};
#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An identifier for a line on a particular chip.
///
/// Valid offsets are in the range 0..`num_lines` as reported in the chip [`Info`](crate::chip::Info).
pub type Offset = gpioline_uapi::Offset;

/// The default consumer label applied to requested lines.
pub const DEFAULT_LABEL: &str = "gpioline";

/// The direction of a line.
///
/// `High` and `Low` request an output with the given initial physical level.
/// `Out` is an output initialised low.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Direction {
    /// The line is an input.
    #[default]
    In,

    /// The line is an output.
    Out,

    /// The line is an output, initially driven high.
    High,

    /// The line is an output, initially driven low.
    Low,
}

impl Direction {
    /// Returns true for any of the output directions.
    pub fn is_output(&self) -> bool {
        !matches!(self, Direction::In)
    }

    /// The physical level an output is initially driven to.
    pub(crate) fn initial_level(&self) -> bool {
        matches!(self, Direction::High)
    }

    /// The direction as reported once the line is requested.
    ///
    /// The initial level is only relevant to the request, so outputs collapse to `Out`.
    pub(crate) fn settled(&self) -> Direction {
        if self.is_output() {
            Direction::Out
        } else {
            Direction::In
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "in" => Direction::In,
            "out" => Direction::Out,
            "high" => Direction::High,
            "low" => Direction::Low,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "invalid direction \"{s}\", can be: \"in\", \"out\", \"high\", \"low\""
                )))
            }
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::High => "high",
            Direction::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// The edge detection options for an input line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Edge {
    /// Edge detection is disabled.
    #[default]
    None,

    /// Edge detection is only enabled on rising edges.
    Rising,

    /// Edge detection is only enabled on falling edges.
    Falling,

    /// Edge detection is enabled on both rising and falling edges.
    Both,
}

impl FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "none" => Edge::None,
            "rising" => Edge::Rising,
            "falling" => Edge::Falling,
            "both" => Edge::Both,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "invalid edge \"{s}\", can be: \"none\", \"rising\", \"falling\", \"both\""
                )))
            }
        })
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Edge::None => "none",
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Both => "both",
        };
        write!(f, "{s}")
    }
}

/// The bias settings for a line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Bias {
    /// The bias is left as the kernel or hardware default.
    #[default]
    Default,

    /// The line has pull-up enabled.
    PullUp,

    /// The line has pull-down enabled.
    PullDown,

    /// The line has bias disabled and will float unless externally driven.
    Disable,
}

impl FromStr for Bias {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "default" => Bias::Default,
            "pull_up" => Bias::PullUp,
            "pull_down" => Bias::PullDown,
            "disable" => Bias::Disable,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "invalid bias \"{s}\", can be: \"default\", \"pull_up\", \"pull_down\", \"disable\""
                )))
            }
        })
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bias::Default => "default",
            Bias::PullUp => "pull_up",
            Bias::PullDown => "pull_down",
            Bias::Disable => "disable",
        };
        write!(f, "{s}")
    }
}

/// The drive policy settings for an output line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Drive {
    /// The line is driven when both active and inactive.
    #[default]
    Default,

    /// The line is driven when low and set high impedance when high.
    OpenDrain,

    /// The line is driven when high and set high impedance when low.
    OpenSource,
}

impl FromStr for Drive {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "default" => Drive::Default,
            "open_drain" => Drive::OpenDrain,
            "open_source" => Drive::OpenSource,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "invalid drive \"{s}\", can be: \"default\", \"open_drain\", \"open_source\""
                )))
            }
        })
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Drive::Default => "default",
            Drive::OpenDrain => "open_drain",
            Drive::OpenSource => "open_source",
        };
        write!(f, "{s}")
    }
}

/// The configuration of a single line.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// The direction of the line.
    pub direction: Direction,

    /// The edges detected on an input line.
    pub edge: Edge,

    /// The bias applied to the line.
    pub bias: Bias,

    /// The drive policy of an output line.
    pub drive: Drive,

    /// Whether the line is active low.
    pub inverted: bool,

    /// The consumer label applied to the requested line.
    pub label: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            direction: Direction::default(),
            edge: Edge::default(),
            bias: Bias::default(),
            drive: Drive::default(),
            inverted: false,
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Check the combination of settings is consistent.
    ///
    /// Edge detection requires an input, and a drive policy requires an output.
    pub fn validate(&self) -> Result<()> {
        if self.edge != Edge::None && self.direction.is_output() {
            return Err(Error::InvalidOperation("cannot set edge on output GPIO"));
        }
        if self.drive != Drive::Default && !self.direction.is_output() {
            return Err(Error::InvalidOperation(
                "cannot set line drive on input GPIO",
            ));
        }
        Ok(())
    }

    /// The logical value requested for an output, given its initial physical level.
    pub(crate) fn initial_value(&self) -> bool {
        self.direction.initial_level() ^ self.inverted
    }

    pub(crate) fn v1_handle_flags(&self) -> v1::HandleRequestFlags {
        let mut flags = v1::HandleRequestFlags::default();
        if self.direction.is_output() {
            flags |= v1::HandleRequestFlags::OUTPUT;
        } else {
            flags |= v1::HandleRequestFlags::INPUT;
        }
        if self.inverted {
            flags |= v1::HandleRequestFlags::ACTIVE_LOW;
        }
        flags |= match self.bias {
            Bias::Default => v1::HandleRequestFlags::empty(),
            Bias::PullUp => v1::HandleRequestFlags::BIAS_PULL_UP,
            Bias::PullDown => v1::HandleRequestFlags::BIAS_PULL_DOWN,
            Bias::Disable => v1::HandleRequestFlags::BIAS_DISABLED,
        };
        flags |= match self.drive {
            Drive::Default => v1::HandleRequestFlags::empty(),
            Drive::OpenDrain => v1::HandleRequestFlags::OPEN_DRAIN,
            Drive::OpenSource => v1::HandleRequestFlags::OPEN_SOURCE,
        };
        flags
    }

    pub(crate) fn v1_event_flags(&self) -> v1::EventRequestFlags {
        match self.edge {
            Edge::None => v1::EventRequestFlags::empty(),
            Edge::Rising => v1::EventRequestFlags::RISING_EDGE,
            Edge::Falling => v1::EventRequestFlags::FALLING_EDGE,
            Edge::Both => v1::EventRequestFlags::BOTH_EDGES,
        }
    }

    pub(crate) fn v2_flags(&self) -> v2::LineFlags {
        let mut flags = v2::LineFlags::default();
        if self.direction.is_output() {
            flags |= v2::LineFlags::OUTPUT;
        } else {
            flags |= v2::LineFlags::INPUT;
        }
        if self.inverted {
            flags |= v2::LineFlags::ACTIVE_LOW;
        }
        flags |= match self.edge {
            Edge::None => v2::LineFlags::empty(),
            Edge::Rising => v2::LineFlags::EDGE_RISING,
            Edge::Falling => v2::LineFlags::EDGE_FALLING,
            Edge::Both => v2::LineFlags::EDGE_RISING | v2::LineFlags::EDGE_FALLING,
        };
        if self.edge != Edge::None {
            flags |= v2::LineFlags::EVENT_CLOCK_REALTIME;
        }
        flags |= match self.bias {
            Bias::Default => v2::LineFlags::empty(),
            Bias::PullUp => v2::LineFlags::BIAS_PULL_UP,
            Bias::PullDown => v2::LineFlags::BIAS_PULL_DOWN,
            Bias::Disable => v2::LineFlags::BIAS_DISABLED,
        };
        flags |= match self.drive {
            Drive::Default => v2::LineFlags::empty(),
            Drive::OpenDrain => v2::LineFlags::OPEN_DRAIN,
            Drive::OpenSource => v2::LineFlags::OPEN_SOURCE,
        };
        flags
    }
}

/// Identifies a line on a chip, either by offset or by name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineId {
    /// The offset of the line on the chip.
    Offset(Offset),

    /// The name of the line, as reported by the chip.
    Name(String),
}

impl From<Offset> for LineId {
    fn from(offset: Offset) -> Self {
        LineId::Offset(offset)
    }
}

impl From<&str> for LineId {
    fn from(name: &str) -> Self {
        LineId::Name(name.to_string())
    }
}

impl From<String> for LineId {
    fn from(name: String) -> Self {
        LineId::Name(name)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Offset(offset) => write!(f, "{offset}"),
            LineId::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

/// The publicly available information for a line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Info {
    /// The line offset on the chip.
    pub offset: Offset,

    /// The name of the line, as specified by the chip.  May be empty.
    pub name: String,

    /// The consumer label of the current user of the line, if any.
    pub consumer: String,

    /// True if the line is in use.
    pub used: bool,

    /// The direction of the line.
    pub direction: Direction,

    /// True if the line is active low.
    pub inverted: bool,
}

impl From<&v1::LineInfo> for Info {
    fn from(li: &v1::LineInfo) -> Self {
        Info {
            offset: li.offset,
            name: String::from(&li.name),
            consumer: String::from(&li.consumer),
            used: li.flags.contains(v1::LineInfoFlags::USED),
            direction: if li.flags.contains(v1::LineInfoFlags::OUTPUT) {
                Direction::Out
            } else {
                Direction::In
            },
            inverted: li.flags.contains(v1::LineInfoFlags::ACTIVE_LOW),
        }
    }
}

impl From<&v2::LineInfo> for Info {
    fn from(li: &v2::LineInfo) -> Self {
        Info {
            offset: li.offset,
            name: String::from(&li.name),
            consumer: String::from(&li.consumer),
            used: li.flags.contains(v2::LineFlags::USED),
            direction: if li.flags.contains(v2::LineFlags::OUTPUT) {
                Direction::Out
            } else {
                Direction::In
            },
            inverted: li.flags.contains(v2::LineFlags::ACTIVE_LOW),
        }
    }
}

/// The cause of an [`EdgeEvent`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EdgeKind {
    /// Indicates the line transitioned from inactive to active.
    Rising,

    /// Indicates the line transitioned from active to inactive.
    Falling,
}

impl From<LineEdgeEventKind> for EdgeKind {
    fn from(kind: LineEdgeEventKind) -> Self {
        match kind {
            LineEdgeEventKind::RisingEdge => EdgeKind::Rising,
            LineEdgeEventKind::FallingEdge => EdgeKind::Falling,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Rising => write!(f, "rising"),
            EdgeKind::Falling => write!(f, "falling"),
        }
    }
}

/// The details of an edge detected on an input line.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeEvent {
    /// The direction of the transition.
    pub kind: EdgeKind,

    /// The best estimate of time of event occurrence, in nanoseconds.
    ///
    /// With ABI v2 this is read from **CLOCK_REALTIME**.  With ABI v1 the
    /// clock depends on the kernel, being **CLOCK_MONOTONIC** from Linux v5.7.
    pub timestamp_ns: u64,
}

impl From<&v1::LineEdgeEvent> for EdgeEvent {
    fn from(le: &v1::LineEdgeEvent) -> Self {
        EdgeEvent {
            kind: le.kind.into(),
            timestamp_ns: le.timestamp_ns,
        }
    }
}

impl From<&v2::LineEdgeEvent> for EdgeEvent {
    fn from(le: &v2::LineEdgeEvent) -> Self {
        EdgeEvent {
            kind: le.kind.into(),
            timestamp_ns: le.timestamp_ns,
        }
    }
}
