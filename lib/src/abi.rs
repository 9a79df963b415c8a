// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::cdev::CdevLine;
use crate::line::{Bias, Direction, LineId};
use crate::sysfs::SysfsLine;
use crate::{AbiVersion, Error, Line, Result};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// The first kernel release providing ABI v2.
pub const ABI_V2_KERNEL: KernelVersion = KernelVersion::new(5, 10);

/// The first kernel release supporting line bias with ABI v1.
pub const BIAS_KERNEL: KernelVersion = KernelVersion::new(5, 5);

/// The major and minor version of a Linux kernel release.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KernelVersion {
    /// The major version number.
    pub major: u32,

    /// The minor version number.
    pub minor: u32,
}

impl KernelVersion {
    /// Construct a KernelVersion.
    pub const fn new(major: u32, minor: u32) -> Self {
        KernelVersion { major, minor }
    }

    /// Parse the version from a kernel release string, such as "5.15.0-91-generic".
    ///
    /// Components that cannot be parsed are reported as 0, so an unrecognised
    /// release is version 0.0.
    pub fn from_release(release: &str) -> Self {
        let mut parts = release
            .split(|c: char| !c.is_ascii_digit())
            .map(|p| p.parse::<u32>());
        match (parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor))) => KernelVersion::new(major, minor),
            _ => KernelVersion::default(),
        }
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The version of the running kernel.
///
/// Determined once per process.
pub fn kernel_version() -> KernelVersion {
    static KERNEL: OnceLock<KernelVersion> = OnceLock::new();
    *KERNEL.get_or_init(|| {
        let kv = uname_release()
            .map(|r| KernelVersion::from_release(&r))
            .unwrap_or_default();
        tracing::debug!(kernel = %kv, "detected kernel version");
        kv
    })
}

fn uname_release() -> Option<String> {
    nix::sys::utsname::uname()
        .ok()
        .map(|uts| uts.release().to_string_lossy().into_owned())
}

/// The ABI version supported by a given kernel.
pub fn abi_version_for(kernel: KernelVersion) -> AbiVersion {
    if kernel >= ABI_V2_KERNEL {
        AbiVersion::V2
    } else {
        AbiVersion::V1
    }
}

/// Select the most recent uAPI ABI version supported by the running kernel.
pub fn select_abi_version() -> AbiVersion {
    abi_version_for(kernel_version())
}

/// Check that the bias setting can be applied on the given kernel.
///
/// Bias other than the default requires Linux v5.5 or later.
pub fn check_bias(abiv: AbiVersion, kernel: KernelVersion, bias: Bias) -> Result<()> {
    if bias != Bias::Default && kernel < BIAS_KERNEL {
        return Err(Error::AbiLimitation(
            abiv,
            format!("does not support line bias on Linux {kernel}, requires {BIAS_KERNEL}"),
        ));
    }
    Ok(())
}

/// Open a line using the backend selected by the presence of a chip path.
///
/// With a chip path the line is requested from that GPIO character device,
/// using the ABI version supported by the kernel.
/// Without one the line is exported through sysfs, in which case the line
/// must be identified by its global number.
pub fn open<P: AsRef<Path>, L: Into<LineId>>(
    chip_path: Option<P>,
    line: L,
    direction: Direction,
) -> Result<Line> {
    match chip_path {
        Some(path) => CdevLine::open(path, line, direction).map(Line::Cdev),
        None => match line.into() {
            LineId::Offset(offset) => SysfsLine::open(offset, direction).map(Line::Sysfs),
            LineId::Name(name) => Err(Error::InvalidArgument(format!(
                "sysfs lines cannot be identified by name: \"{name}\""
            ))),
        },
    }
}
