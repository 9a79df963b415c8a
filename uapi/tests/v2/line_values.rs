// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::wait_propagation_delay;
use errno::Errno;

fn request_all(f: &fs::File, flags: LineFlags) -> fs::File {
    let mut lr = LineRequest {
        num_lines: 4,
        consumer: "line_values".into(),
        config: LineConfig {
            flags,
            ..Default::default()
        },
        ..Default::default()
    };
    for idx in 0..4 {
        lr.offsets.set(idx, idx as Offset);
    }
    get_line(f, lr).unwrap()
}

fn all_masked() -> LineValues {
    LineValues {
        bits: 0,
        mask: 0xf,
    }
}

#[test]
fn get_on_input() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = request_all(&f, LineFlags::INPUT);

    // sim defaults to pulling low
    let mut values = all_masked();
    get_line_values(&l, &mut values).unwrap();
    assert_eq!(values.bits, 0);

    s.set_pull(0, Level::High).unwrap();
    s.set_pull(3, Level::High).unwrap();
    wait_propagation_delay();
    get_line_values(&l, &mut values).unwrap();
    assert_eq!(values.get(0), Some(true));
    assert_eq!(values.get(1), Some(false));
    assert_eq!(values.get(2), Some(false));
    assert_eq!(values.get(3), Some(true));
}

#[test]
fn set_on_output() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = request_all(&f, LineFlags::OUTPUT);

    let mut values = all_masked();
    values.set(0, true);
    values.set(3, true);
    assert_eq!(set_line_values(&l, &values), Ok(()));
    wait_propagation_delay();
    assert_eq!(s.get_level(0).unwrap(), Level::High);
    assert_eq!(s.get_level(1).unwrap(), Level::Low);
    assert_eq!(s.get_level(2).unwrap(), Level::Low);
    assert_eq!(s.get_level(3).unwrap(), Level::High);

    let mut readback = all_masked();
    get_line_values(&l, &mut readback).unwrap();
    assert_eq!(readback.bits, 0x9);
}

#[test]
fn set_on_input() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = request_all(&f, LineFlags::INPUT);
    assert_eq!(
        set_line_values(&l, &all_masked()),
        Err(Error::Os(Errno(libc::EPERM)))
    );
}

#[test]
fn get_with_no_mask() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = request_all(&f, LineFlags::INPUT);
    let mut values = LineValues::default();
    assert_eq!(
        get_line_values(&l, &mut values),
        Err(Error::Os(Errno(libc::EINVAL)))
    );
}
