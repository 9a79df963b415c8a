// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-layout mirrors of the Linux GPIO character device uAPI records,
//! and the ioctls that exchange them.
//!
//! Every struct here matches `linux/gpio.h` byte for byte, including padding,
//! as the kernel copies them in and out of userspace verbatim.

#[macro_use]
pub(crate) mod common;

pub use common::{
    get_chip_info, has_event, read_event, ChipInfo, Error, LineEdgeEventKind, Name, Offset,
    Offsets, Padding, Result, UnderReadError, ValidationError, LINES_MAX, NAME_MAX,
};

/// GPIO ABI v1, released in Linux v4.8.
///
/// Only used on kernels that predate ABI v2.
#[cfg(feature = "uapi_v1")]
pub mod v1;

/// GPIO ABI v2, released in Linux v5.10.
#[cfg(feature = "uapi_v2")]
pub mod v2;
