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
            assert!(info.flags.contains(LineFlags::USED));
            assert_eq!(String::from(&info.consumer), hog.consumer);
        }
        let info = get_line_info(&f, 1).unwrap();
        assert!(info.name.is_empty());
        assert!(!info.flags.contains(LineFlags::USED));
        assert!(info.flags.contains(LineFlags::INPUT));
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

#[test]
fn reflects_request() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let mut lr = LineRequest {
        num_lines: 1,
        consumer: "reflects_request".into(),
        config: LineConfig {
            flags: LineFlags::OUTPUT | LineFlags::ACTIVE_LOW | LineFlags::OPEN_DRAIN,
            ..Default::default()
        },
        ..Default::default()
    };
    lr.offsets.set(0, 2);
    let _l = get_line(&f, lr).unwrap();

    let info = get_line_info(&f, 2).unwrap();
    assert_eq!(String::from(&info.consumer), "reflects_request");
    assert!(info.flags.contains(
        LineFlags::USED | LineFlags::OUTPUT | LineFlags::ACTIVE_LOW | LineFlags::OPEN_DRAIN
    ));
    assert!(!info.flags.contains(LineFlags::INPUT));
}
