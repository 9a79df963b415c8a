// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::wait_propagation_delay;
use errno::Errno;

fn request(offset: Offset, flags: HandleRequestFlags, value: u8) -> HandleRequest {
    let mut hr = HandleRequest {
        num_lines: 1,
        flags,
        consumer: "get_line_handle".into(),
        ..Default::default()
    };
    hr.offsets.set(0, offset);
    hr.values.set(0, value);
    hr
}

#[test]
fn as_output() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = get_line_handle(&f, request(1, HandleRequestFlags::OUTPUT, 1)).unwrap();
    wait_propagation_delay();
    assert_eq!(s.get_level(1).unwrap(), Level::High);

    let info = get_line_info(&f, 1).unwrap();
    assert!(info.flags.contains(LineInfoFlags::USED | LineInfoFlags::OUTPUT));
    assert_eq!(String::from(&info.consumer), "get_line_handle");

    set_line_values(&l, &LineValues::from_slice(&[0])).unwrap();
    wait_propagation_delay();
    assert_eq!(s.get_level(1).unwrap(), Level::Low);
}

#[test]
fn as_input() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = get_line_handle(&f, request(2, HandleRequestFlags::INPUT, 0)).unwrap();
    let mut values = LineValues::default();
    get_line_values(&l, &mut values).unwrap();
    assert_eq!(values.get(0), 0);

    s.pullup(2).unwrap();
    wait_propagation_delay();
    get_line_values(&l, &mut values).unwrap();
    assert_eq!(values.get(0), 1);

    assert_eq!(
        set_line_values(&l, &values),
        Err(Error::Os(Errno(libc::EPERM)))
    );
}

#[test]
fn as_active_low() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let _l = get_line_handle(
        &f,
        request(
            0,
            HandleRequestFlags::OUTPUT | HandleRequestFlags::ACTIVE_LOW,
            1,
        ),
    )
    .unwrap();
    wait_propagation_delay();
    assert_eq!(s.get_level(0).unwrap(), Level::Low);
}

#[test]
fn while_busy() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let _l = get_line_handle(&f, request(3, HandleRequestFlags::INPUT, 0)).unwrap();
    assert_eq!(
        get_line_handle(&f, request(3, HandleRequestFlags::INPUT, 0)).unwrap_err(),
        Error::Os(Errno(libc::EBUSY))
    );
}
