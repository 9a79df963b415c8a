// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::detailed_sim;
use errno::Errno;

#[test]
fn check_info() {
    let sim = detailed_sim();
    for sc in sim.chips() {
        let f = fs::File::open(sc.dev_path()).unwrap();
        for (offset, name) in &sc.config().names {
            let info = get_line_info(&f, *offset).unwrap();
            assert_eq!(info.offset, *offset);
            assert_eq!(String::from(&info.name), *name);
        }
        for (offset, hog) in &sc.config().hogs {
            let info = get_line_info(&f, *offset).unwrap();
            assert!(info.flags.contains(LineInfoFlags::USED));
            assert_eq!(String::from(&info.consumer), hog.consumer);
        }
    }
}

#[test]
fn with_offset_out_of_range() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    assert_eq!(
        get_line_info(&f, 4),
        Err(Error::Os(Errno(libc::EINVAL)))
    );
}
