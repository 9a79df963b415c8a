// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bitflags::bitflags;
use std::fmt;
use std::fs::File;
use std::mem;
use std::os::unix::prelude::{AsRawFd, FromRawFd};

use super::common::ValidationResult;

// common to ABI v1 and v2.
pub use super::common::{
    get_chip_info, ChipInfo, Error, LineEdgeEventKind, Name, Offset, Offsets, Padding, Result,
    UnderReadError, ValidationError,
};

#[repr(u8)]
enum Ioctl {
    GetLineInfo = 5,
    GetLine = 7,
    GetLineValues = 0xE,
    SetLineValues = 0xF,
}

bitflags! {
    /// Flags indicating the configuration of a line.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct LineFlags: u64 {
        /// The line is in use and is not available for request.
        const USED = 1;

        /// The line active state corresponds to a physical low.
        const ACTIVE_LOW = 2;

        /// The line is an input.
        const INPUT = 4;

        /// The line is an output.
        const OUTPUT = 8;

        /// The line detects rising (*inactive* to *active*) edges.
        const EDGE_RISING = 16;

        /// The line detects falling (*active* to *inactive*) edges.
        const EDGE_FALLING = 32;

        /// The line is an open drain output.
        const OPEN_DRAIN = 64;

        /// The line is an open source output.
        const OPEN_SOURCE = 128;

        /// The line has pull-up bias enabled.
        const BIAS_PULL_UP = 256;

        /// The line has pull-down bias enabled.
        const BIAS_PULL_DOWN = 512;

        /// The line has bias disabled.
        const BIAS_DISABLED = 1024;

        /// The line events contain **CLOCK_REALTIME** timestamps.
        const EVENT_CLOCK_REALTIME = 2048;

        /// The line events contain **HTE** timestamps.
        const EVENT_CLOCK_HTE = 4096;
    }
}

/// A bitmap of line values paired with the mask of lines they apply to.
///
/// Bits in the bitmaps correspond to the index into [`LineRequest.offsets`].
/// The first requested line, `offsets[0]`, is bit 0.
///
/// [`LineRequest.offsets`]: struct@LineRequest
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LineValues {
    /// The value of the lines, set to 1 for *active* and 0 for *inactive*.
    pub bits: u64,

    /// The lines in a request to access, set to 1 to access and 0 to ignore.
    pub mask: u64,
}

impl LineValues {
    /// Return the value of a line.
    ///
    /// Returns None if the line of interest is not set in the mask.
    ///
    /// * `idx` - The index into the [`LineRequest.offsets`] for the line of interest.
    ///
    /// [`LineRequest.offsets`]: struct@LineRequest
    #[inline]
    pub fn get(&self, idx: usize) -> Option<bool> {
        debug_assert!(idx < 64);
        let mask = 0x01 << idx;
        if self.mask & mask == 0 {
            return None;
        }
        Some(self.bits & mask != 0)
    }

    /// Set the value of a line, and add it to the mask.
    ///
    /// * `idx` - The index into the [`LineRequest.offsets`] for the line of interest.
    /// * `active` - The logical state of the line to be set.
    ///
    /// [`LineRequest.offsets`]: struct@LineRequest
    #[inline]
    pub fn set(&mut self, idx: usize, active: bool) {
        debug_assert!(idx < 64);
        let mask = 0x01 << idx;
        self.mask |= mask;
        if active {
            self.bits |= mask;
        } else {
            self.bits &= !mask;
        }
    }
}

/// Read the values of the lines in a request.
///
/// Only lines set in the `lv.mask` are read.
///
/// * `lf` - The request file returned by [`get_line`].
/// * `lv` - The line values to be populated.
#[inline]
pub fn get_line_values(lf: &File, lv: &mut LineValues) -> Result<()> {
    // SAFETY: returned struct contains raw integers that are safe to decode.
    match unsafe { libc::ioctl(lf.as_raw_fd(), iorw!(Ioctl::GetLineValues, LineValues), lv) } {
        0 => Ok(()),
        _ => Err(Error::from_errno()),
    }
}

/// Set the values of output lines in a request.
///
/// The kernel rejects a set that includes an input line.
///
/// * `lf` - The request file returned by [`get_line`].
/// * `lv` - The line values to be set.
#[inline]
pub fn set_line_values(lf: &File, lv: &LineValues) -> Result<()> {
    // SAFETY: lv is not modified.
    match unsafe { libc::ioctl(lf.as_raw_fd(), iorw!(Ioctl::SetLineValues, LineValues), lv) } {
        0 => Ok(()),
        _ => Err(Error::from_errno()),
    }
}

/// An identifier for which field of the [`LineAttributeValueUnion`] is in use.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineAttributeKind {
    /// The attribute is *inactive* - no fields are in use.
    #[default]
    Unused = 0,

    /// The flags field is in use.
    Flags = 1,

    /// The values field is in use.
    Values = 2,

    /// The debounce_period_us field is in use.
    Debounce = 3,
}

impl TryFrom<u32> for LineAttributeKind {
    type Error = String;

    fn try_from(v: u32) -> std::result::Result<Self, Self::Error> {
        use LineAttributeKind::*;
        Ok(match v {
            x if x == Unused as u32 => Unused,
            x if x == Flags as u32 => Flags,
            x if x == Values as u32 => Values,
            x if x == Debounce as u32 => Debounce,
            x => return Err(format!("invalid value: {x}")),
        })
    }
}

impl LineAttributeKind {
    /// Confirm that the value read from the kernel is valid in Rust.
    fn validate(&self) -> std::result::Result<(), String> {
        LineAttributeKind::try_from(*self as u32).map(|_i| ())
    }
}

/// A per-line attribute, tagged by [`LineAttributeKind`].
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct LineAttribute {
    /// The type of attribute stored in `value`.
    pub kind: LineAttributeKind,

    /// Reserved for future use and must be zero filled.
    #[doc(hidden)]
    pub padding: Padding<1>,

    /// The attribute value.
    pub value: LineAttributeValueUnion,
}

impl LineAttribute {
    /// Set the attribute as output values.
    pub fn set_values(&mut self, values: u64) {
        self.kind = LineAttributeKind::Values;
        self.value.values = values;
    }
}

impl fmt::Debug for LineAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: checks kind before accessing union
        unsafe {
            match self.kind {
                LineAttributeKind::Unused => write!(f, "unused"),
                LineAttributeKind::Flags => write!(f, "flags: {:?}", self.value.flags),
                LineAttributeKind::Values => write!(f, "values: {:08x}", self.value.values),
                LineAttributeKind::Debounce => {
                    write!(f, "debounce_period_us: {}", self.value.debounce_period_us)
                }
            }
        }
    }
}

impl PartialEq for LineAttribute {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        // SAFETY: checks kind before accessing union
        unsafe {
            match self.kind {
                LineAttributeKind::Unused => true,
                LineAttributeKind::Flags => self.value.flags == other.value.flags,
                LineAttributeKind::Values => self.value.values == other.value.values,
                LineAttributeKind::Debounce => {
                    self.value.debounce_period_us == other.value.debounce_period_us
                }
            }
        }
    }
}
impl Eq for LineAttribute {}

/// The value of a particular line attribute.
#[repr(C)]
#[derive(Clone, Copy)]
pub union LineAttributeValueUnion {
    /// The line configuration flags.
    pub flags: LineFlags,

    /// The values to which the lines will be set, with each bit number
    /// corresponding to the index into [`LineRequest.offsets`].
    ///
    /// [`LineRequest.offsets`]: struct@LineRequest
    pub values: u64,

    /// The debounce period, in microseconds.
    pub debounce_period_us: u32,
}

impl Default for LineAttributeValueUnion {
    fn default() -> Self {
        LineAttributeValueUnion {
            flags: Default::default(),
        }
    }
}

/// A configuration attribute associated with one or more of the requested lines.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LineConfigAttribute {
    /// The configurable attribute.
    pub attr: LineAttribute,

    /// The lines to which the attribute applies, with each bit number corresponding
    /// to the index into [`LineRequest.offsets`].
    ///
    /// [`LineRequest.offsets`]: struct@LineRequest
    pub mask: u64,
}

/// The set of additional configuration attributes for a line request.
///
/// [`LineConfig.num_attrs`] specifies the number of entries in use.
///
/// [`LineConfig.num_attrs`]: struct@LineConfig
#[repr(C)]
#[derive(Clone, Debug, Default)]
pub struct LineConfigAttributes(pub [LineConfigAttribute; NUM_ATTRS_MAX]);

/// Configuration for a set of requested lines.
#[repr(C)]
#[derive(Clone, Debug, Default)]
pub struct LineConfig {
    /// Flags for the GPIO lines.  This is the default for all requested lines but
    /// may be overridden for particular lines using `attrs`.
    pub flags: LineFlags,

    /// The number of attributes active in `attrs`.
    pub num_attrs: u32,

    /// Reserved for future use and must be zero filled.
    #[doc(hidden)]
    pub padding: Padding<5>,

    /// The configuration attributes associated with the requested lines.
    pub attrs: LineConfigAttributes,
}

impl LineConfig {
    /// The attribute at `idx`.
    #[inline]
    pub fn attr(&self, idx: usize) -> &LineConfigAttribute {
        &self.attrs.0[idx]
    }

    /// Add a line values attribute to the config.
    ///
    /// Sets the initial values of output lines.
    pub fn add_values(&mut self, values: &LineValues) {
        let lca = &mut self.attrs.0[self.num_attrs as usize];
        lca.mask = values.mask;
        lca.attr.set_values(values.bits);
        self.num_attrs += 1;
    }
}

/// A v2 line request.
#[repr(C)]
#[derive(Clone, Debug, Default)]
pub struct LineRequest {
    /// An array of requested lines, identified by offset on the associated GPIO chip.
    pub offsets: Offsets,

    /// The consumer label applied to the requested lines.
    pub consumer: Name,

    /// The requested configuration for the lines.
    pub config: LineConfig,

    /// The number of lines requested in this request.
    pub num_lines: u32,

    /// A suggested minimum number of line events that the kernel should buffer.
    ///
    /// Zero selects the kernel default of `num_lines*16`.
    pub event_buffer_size: u32,

    /// Reserved for future use and must be zero filled.
    #[doc(hidden)]
    pub padding: Padding<5>,

    /// Filled in by the kernel with the descriptor of the request.
    #[doc(hidden)]
    pub fd: i32,
}

/// Request lines, returning the request file.
///
/// * `cf` - The chip file.
/// * `lr` - The line request.
#[inline]
pub fn get_line(cf: &File, mut lr: LineRequest) -> Result<File> {
    // SAFETY: lr is consumed and the returned file is drawn from the returned fd.
    unsafe {
        match libc::ioctl(cf.as_raw_fd(), iorw!(Ioctl::GetLine, LineRequest), &mut lr) {
            0 => Ok(File::from_raw_fd(lr.fd)),
            _ => Err(Error::from_errno()),
        }
    }
}

/// The set of potential configuration attributes for a line.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LineAttributes([LineAttribute; NUM_ATTRS_MAX]);

/// The capacity of [`LineAttributes`] and [`LineConfigAttributes`] arrays.
pub const NUM_ATTRS_MAX: usize = 10;

/// The kernel's description of a single line.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineInfo {
    /// The name of this GPIO line, as specified by the GPIO chip.
    ///
    /// May be empty.
    pub name: Name,

    /// The label of the current consumer.
    ///
    /// Empty for a free line, or a consumer that did not provide one.
    pub consumer: Name,

    /// The offset of the line on its chip.
    pub offset: Offset,

    /// The number of attributes active in `attrs`.
    pub num_attrs: u32,

    /// The configuration flags for this GPIO line.
    pub flags: LineFlags,

    /// Additional configuration attributes associated with the line.
    pub attrs: LineAttributes,

    /// Reserved for future use.
    #[doc(hidden)]
    pub padding: Padding<4>,
}

impl LineInfo {
    /// Check that a LineInfo read from the kernel is valid in Rust.
    fn validate(&self) -> ValidationResult {
        if self.num_attrs > NUM_ATTRS_MAX as u32 {
            return Err(ValidationError::new(
                "num_attrs",
                format!("out of range: {}", self.num_attrs),
            ));
        }
        for i in 0..NUM_ATTRS_MAX {
            if let Err(e) = self.attrs.0[i].kind.validate() {
                return Err(ValidationError::new(format!("attrs[{i}].kind"), e));
            }
        }
        Ok(())
    }
}

/// Read the description of a line from the chip.
///
/// The value of the line is not included.
///
/// * `cf` - The chip file.
/// * `offset` - The line offset on the chip.
#[inline]
pub fn get_line_info(cf: &File, offset: Offset) -> Result<LineInfo> {
    let mut li = LineInfo {
        offset,
        ..Default::default()
    };
    // SAFETY: returned struct is explicitly validated before being returned.
    match unsafe { libc::ioctl(cf.as_raw_fd(), iorw!(Ioctl::GetLineInfo, LineInfo), &mut li) } {
        0 => li.validate().map(|_| li).map_err(Error::from),
        _ => Err(Error::from_errno()),
    }
}

/// An edge event read from a request file.
#[repr(C)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineEdgeEvent {
    /// The best estimate of time of event occurrence, in nanoseconds.
    ///
    /// Read from **CLOCK_MONOTONIC** by default, or from **CLOCK_REALTIME** if
    /// the [`LineFlags::EVENT_CLOCK_REALTIME`] flag is set.
    pub timestamp_ns: u64,

    /// The event trigger identifier.
    pub kind: LineEdgeEventKind,

    /// The offset of the line that triggered the event.
    pub offset: Offset,

    /// The sequence number for this event in the sequence of events for all
    /// the lines in this line request.
    pub seqno: u32,

    /// The sequence number for this event in the sequence of events on this
    /// particular line.
    pub line_seqno: u32,

    /// Reserved for future use.
    #[doc(hidden)]
    pub padding: Padding<6>,
}

impl LineEdgeEvent {
    /// Read an edge event from a buffer.
    ///
    /// The buffer is assumed to have been populated by a read of the line request File,
    /// so the content is validated before being returned.
    #[inline]
    pub fn from_slice(d: &[u64]) -> Result<&LineEdgeEvent> {
        debug_assert!(mem::size_of::<LineEdgeEvent>() % 8 == 0);
        let len = d.len() * 8;
        if len < mem::size_of::<LineEdgeEvent>() {
            return Err(Error::from(UnderReadError::new(
                "LineEdgeEvent",
                mem::size_of::<LineEdgeEvent>(),
                len,
            )));
        }
        // SAFETY: returned struct is explicitly validated before being returned.
        let le = unsafe { &*(d as *const [u64] as *const LineEdgeEvent) };
        le.validate().map(|_| le).map_err(Error::from)
    }

    /// Check that a LineEdgeEvent read from the kernel is valid in Rust.
    fn validate(&self) -> ValidationResult {
        self.kind
            .validate()
            .map_err(|e| ValidationError::new("kind", e))
    }

    /// The number of u64 words required to store a LineEdgeEvent.
    pub fn u64_size() -> usize {
        mem::size_of::<LineEdgeEvent>() / 8
    }
}
