// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bitflags::bitflags;
use std::fs::File;
use std::mem;
use std::os::unix::prelude::{AsRawFd, FromRawFd};

use super::common::ValidationResult;

// common to ABI v1 and v2.
pub use super::common::{
    get_chip_info, ChipInfo, Error, LineEdgeEventKind, Name, Offset, Offsets, Result,
    UnderReadError, ValidationError,
};

#[repr(u8)]
enum Ioctl {
    GetLineInfo = 2,
    GetLineHandle = 3,
    GetLineEvent = 4,
    GetLineValues = 8,
    SetLineValues = 9,
}

/// The kernel's description of a single line.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineInfo {
    /// The offset of the line on its chip.
    pub offset: Offset,

    /// The configuration flags for this line.
    pub flags: LineInfoFlags,

    /// The name of this GPIO line, as specified by the GPIO chip.
    ///
    /// May be empty.
    pub name: Name,

    /// The label of the current consumer.
    ///
    /// Empty for a free line, or a consumer that did not provide one.
    pub consumer: Name,
}

bitflags! {
    /// Flags indicating the configuration of a line.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct LineInfoFlags: u32 {
        /// The line is in use and is not available for request.
        const USED = 1;

        /// The line is an output.
        const OUTPUT = 2;

        /// The line active state corresponds to a physical low.
        const ACTIVE_LOW = 4;

        /// The line is an open drain output.
        const OPEN_DRAIN = 8;

        /// The line is an open source output.
        const OPEN_SOURCE = 16;

        /// The line has pull-up bias enabled.
        const BIAS_PULL_UP = 32;

        /// The line has pull-down bias enabled.
        const BIAS_PULL_DOWN = 64;

        /// The line has bias disabled.
        const BIAS_DISABLED = 128;
    }
}

/// Read the description of a line from the chip.
///
/// The value of the line is not included.
///
/// * `cf` - The chip file.
/// * `offset` - The line offset on the chip.
pub fn get_line_info(cf: &File, offset: Offset) -> Result<LineInfo> {
    let mut li = LineInfo {
        offset,
        ..Default::default()
    };
    // SAFETY: returned struct contains raw byte arrays and bitfields that are safe to decode.
    match unsafe { libc::ioctl(cf.as_raw_fd(), iorw!(Ioctl::GetLineInfo, LineInfo), &mut li) } {
        0 => Ok(li),
        _ => Err(Error::from_errno()),
    }
}

/// A v1 request for line values, without edge detection.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HandleRequest {
    /// An array of requested lines, identified by offset on the associated GPIO device.
    pub offsets: Offsets,

    /// The requested flags for the requested GPIO lines.
    ///
    /// The flags apply to all requested lines.
    pub flags: HandleRequestFlags,

    /// If [`HandleRequestFlags::OUTPUT`] is set, the output value for each offset.
    ///
    /// 0 is *inactive* with all other values taken as *active*.
    pub values: LineValues,

    /// The consumer label applied to the requested lines.
    pub consumer: Name,

    /// The number of lines requested, i.e. the number of valid entries in
    /// `offsets` and `values`.
    pub num_lines: u32,

    /// Filled in by the kernel with the descriptor of the handle.
    //
    // An int in gpio.h, which is i32 on all platforms Linux GPIO runs on.
    #[doc(hidden)]
    pub fd: i32,
}

bitflags! {
    /// Configuration flags for requested lines.
    ///
    /// Several flags, such as BIAS_PULL_UP and BIAS_PULL_DOWN, are mutually
    /// exclusive.  The kernel rejects requests with conflicting flags.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct HandleRequestFlags: u32 {
        /// Requests line as an input.
        const INPUT = 1;

        /// Requests line as an output.
        const OUTPUT = 2;

        /// Requests line as active low.
        const ACTIVE_LOW = 4;

        /// Requests line as open drain.
        const OPEN_DRAIN = 8;

        /// Requests line as open source.
        const OPEN_SOURCE = 16;

        /// Requests line with pull-up bias.
        ///
        /// Requires Linux v5.5 or later.
        const BIAS_PULL_UP = 32;

        /// Requests line with pull-down bias.
        ///
        /// Requires Linux v5.5 or later.
        const BIAS_PULL_DOWN = 64;

        /// Requests line with bias disabled.
        ///
        /// Requires Linux v5.5 or later.
        const BIAS_DISABLED = 128;
    }
}

/// Request lines for values access.
///
/// * `cf` - The chip file.
/// * `hr` - The handle request.
pub fn get_line_handle(cf: &File, mut hr: HandleRequest) -> Result<File> {
    // SAFETY: hr is consumed and the returned file is drawn from the returned fd.
    unsafe {
        match libc::ioctl(
            cf.as_raw_fd(),
            iorw!(Ioctl::GetLineHandle, HandleRequest),
            &mut hr,
        ) {
            0 => Ok(File::from_raw_fd(hr.fd)),
            _ => Err(Error::from_errno()),
        }
    }
}

/// The logical values of the requested lines.
///
/// 0 is *inactive* with all other values taken as *active*.
///
/// Values are stored in the same order as the offsets in [`HandleRequest.offsets`].
///
/// [`HandleRequest.offsets`]: struct@HandleRequest
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineValues([u8; 64usize]);

impl LineValues {
    /// Build values from a slice of levels, in offset order.
    pub fn from_slice(s: &[u8]) -> Self {
        let mut n: LineValues = Default::default();
        for (src, dst) in s.iter().zip(n.0.iter_mut()) {
            *dst = *src;
        }
        n
    }

    /// Return the value of a line.
    ///
    /// * `idx` - The index into the [`HandleRequest.offsets`] for the line of interest.
    ///
    /// [`HandleRequest.offsets`]: struct@HandleRequest
    #[inline]
    pub fn get(&self, idx: usize) -> u8 {
        self.0[idx]
    }

    /// Set the value of a line.
    ///
    /// * `idx` - The index into the [`HandleRequest.offsets`] for the line of interest.
    /// * `value` - The logical state of the line to be set.
    ///
    /// [`HandleRequest.offsets`]: struct@HandleRequest
    #[inline]
    pub fn set(&mut self, idx: usize, value: u8) {
        self.0[idx] = value;
    }
}

impl Default for LineValues {
    fn default() -> Self {
        LineValues([0; 64])
    }
}

/// Read the values of requested lines.
///
/// * `lf` - The file returned by [`get_line_handle`] or [`get_line_event`].
/// * `vals` - The line values to be populated.
pub fn get_line_values(lf: &File, vals: &mut LineValues) -> Result<()> {
    // SAFETY: vals are raw integers that are safe to decode.
    match unsafe {
        libc::ioctl(
            lf.as_raw_fd(),
            iorw!(Ioctl::GetLineValues, LineValues),
            vals.0.as_mut_ptr(),
        )
    } {
        0 => Ok(()),
        _ => Err(Error::from_errno()),
    }
}

/// Set the values of requested output lines.
///
/// * `lf` - The file returned by [`get_line_handle`].
/// * `vals` - The line values to be set.
pub fn set_line_values(lf: &File, vals: &LineValues) -> Result<()> {
    // SAFETY: vals is not modified.
    match unsafe {
        libc::ioctl(
            lf.as_raw_fd(),
            iorw!(Ioctl::SetLineValues, LineValues),
            vals.0.as_ptr(),
        )
    } {
        0 => Ok(()),
        _ => Err(Error::from_errno()),
    }
}

/// A v1 request for a single line with edge detection.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EventRequest {
    /// The line to request edge events from, identified by its offset.
    pub offset: Offset,

    /// The requested handle flags for the GPIO line.
    pub handleflags: HandleRequestFlags,

    /// The requested event flags for the GPIO line.
    pub eventflags: EventRequestFlags,

    /// The consumer label applied to the line.
    pub consumer: Name,

    /// Filled in by the kernel with the descriptor of the request.
    #[doc(hidden)]
    pub fd: i32,
}

bitflags! {
    /// Additional configuration flags for event requests.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct EventRequestFlags: u32 {
        /// Report rising edge events on the requested line.
        const RISING_EDGE = 1;

        /// Report falling edge events on the requested line.
        const FALLING_EDGE = 2;

        /// Report both rising and falling edge events on the requested line.
        const BOTH_EDGES = Self::RISING_EDGE.bits() | Self::FALLING_EDGE.bits();
    }
}

/// Request a line with edge detection enabled.
///
/// Detected events can be read from the returned file.
///
/// * `cf` - The chip file.
/// * `er` - The event request.
pub fn get_line_event(cf: &File, mut er: EventRequest) -> Result<File> {
    // SAFETY: er is consumed and the returned file is drawn from the returned fd.
    unsafe {
        match libc::ioctl(
            cf.as_raw_fd(),
            iorw!(Ioctl::GetLineEvent, EventRequest),
            &mut er,
        ) {
            0 => Ok(File::from_raw_fd(er.fd)),
            _ => Err(Error::from_errno()),
        }
    }
}

/// An edge event read from a request file.
#[repr(C)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineEdgeEvent {
    /// The best estimate of time of event occurrence, in nanoseconds.
    ///
    /// Read from **CLOCK_MONOTONIC** on kernels from v5.7, **CLOCK_REALTIME** before that.
    pub timestamp_ns: u64,

    /// The kind of line event.
    pub kind: LineEdgeEventKind,

    /// Pads the struct to a multiple of 8 bytes, as the kernel does.
    #[doc(hidden)]
    pub padding: super::common::Padding<1>,
}

impl LineEdgeEvent {
    /// Read a LineEdgeEvent from a buffer.
    ///
    /// The buffer is assumed to have been populated by a read of the line request File,
    /// so the content is validated before being returned.
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

#[cfg(test)]
mod tests {
    use super::*;

    mod line_info {
        use super::LineInfo;

        #[test]
        fn size() {
            assert_eq!(
                super::mem::size_of::<LineInfo>(),
                72usize,
                concat!("Size of: ", stringify!(LineInfo))
            );
        }
    }

    mod handle_request {
        use super::HandleRequest;

        #[test]
        fn size() {
            assert_eq!(
                super::mem::size_of::<HandleRequest>(),
                364usize,
                concat!("Size of: ", stringify!(HandleRequest))
            );
        }
    }

    mod event_request {
        use super::{EventRequest, EventRequestFlags};

        #[test]
        fn size() {
            assert_eq!(
                super::mem::size_of::<EventRequest>(),
                48usize,
                concat!("Size of: ", stringify!(EventRequest))
            );
        }

        #[test]
        fn both_edges() {
            assert_eq!(EventRequestFlags::BOTH_EDGES.bits(), 3);
        }
    }

    mod line_event {
        use super::{LineEdgeEvent, LineEdgeEventKind};

        #[test]
        fn size() {
            assert_eq!(
                super::mem::size_of::<LineEdgeEvent>(),
                16usize,
                concat!("Size of: ", stringify!(LineEdgeEvent))
            );
            assert_eq!(LineEdgeEvent::u64_size(), 2);
        }

        #[test]
        fn from_slice() {
            let buf = [1234_u64, 2];
            let le = LineEdgeEvent::from_slice(&buf).unwrap();
            assert_eq!(le.timestamp_ns, 1234);
            assert_eq!(le.kind, LineEdgeEventKind::FallingEdge);

            let e = LineEdgeEvent::from_slice(&buf[..1]).unwrap_err();
            assert_eq!(
                e,
                super::Error::UnderRead(super::UnderReadError::new("LineEdgeEvent", 16, 8))
            );

            let bad = [1234_u64, 7];
            let e = LineEdgeEvent::from_slice(&bad).unwrap_err();
            assert_eq!(
                e,
                super::Error::Validation(super::ValidationError::new("kind", "invalid value: 7"))
            );
        }
    }

    mod line_values {
        use super::LineValues;

        #[test]
        fn get_set() {
            let mut a = LineValues::default();
            for idx in [0, 2] {
                assert_eq!(a.get(idx), 0, "idx: {idx}");
                a.set(idx, 1);
                assert_eq!(a.get(idx), 1, "idx: {idx}");
                a.set(idx, 42);
                assert_eq!(a.get(idx), 42, "idx: {idx}");
            }
            assert_eq!(LineValues::from_slice(&[0, 1]).get(1), 1);
        }

        #[test]
        fn size() {
            assert_eq!(
                super::mem::size_of::<LineValues>(),
                64usize,
                concat!("Size of: ", stringify!(LineValues))
            );
        }
    }
}
