// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::wait_propagation_delay;
use errno::Errno;
use gpioline_uapi::{has_event, read_event};

fn request(offset: Offset, flags: LineFlags) -> LineRequest {
    let mut lr = LineRequest {
        num_lines: 1,
        consumer: "get_line".into(),
        config: LineConfig {
            flags,
            ..Default::default()
        },
        ..Default::default()
    };
    lr.offsets.set(0, offset);
    lr
}

#[test]
fn as_output_with_values() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let mut lr = request(1, LineFlags::OUTPUT);
    let mut lv = LineValues::default();
    lv.set(0, true);
    lr.config.add_values(&lv);

    let _l = get_line(&f, lr).unwrap();
    wait_propagation_delay();
    assert_eq!(s.get_level(1).unwrap(), Level::High);
}

#[test]
fn while_busy() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let _l = get_line(&f, request(2, LineFlags::INPUT)).unwrap();
    assert_eq!(
        get_line(&f, request(2, LineFlags::INPUT)).unwrap_err(),
        Error::Os(Errno(libc::EBUSY))
    );
}

#[test]
fn with_offset_out_of_range() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    assert_eq!(
        get_line(&f, request(4, LineFlags::INPUT)).unwrap_err(),
        Error::Os(Errno(libc::EINVAL))
    );
}

#[test]
fn with_edge_detection() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let l = get_line(
        &f,
        request(
            3,
            LineFlags::INPUT
                | LineFlags::EDGE_RISING
                | LineFlags::EDGE_FALLING
                | LineFlags::EVENT_CLOCK_REALTIME,
        ),
    )
    .unwrap();
    assert!(!has_event(&l).unwrap());

    s.pullup(3).unwrap();
    wait_propagation_delay();
    assert!(has_event(&l).unwrap());

    let mut buf = vec![0_u64; LineEdgeEvent::u64_size()];
    let n = read_event(&l, &mut buf).unwrap();
    assert_eq!(n, LineEdgeEvent::u64_size());
    let evt = LineEdgeEvent::from_slice(&buf).unwrap();
    assert_eq!(evt.kind, LineEdgeEventKind::RisingEdge);
    assert_eq!(evt.offset, 3);
    assert_eq!(evt.seqno, 1);
    assert_eq!(evt.line_seqno, 1);
    assert!(evt.timestamp_ns > 0);

    s.pulldown(3).unwrap();
    wait_propagation_delay();
    read_event(&l, &mut buf).unwrap();
    let evt = LineEdgeEvent::from_slice(&buf).unwrap();
    assert_eq!(evt.kind, LineEdgeEventKind::FallingEdge);
    assert_eq!(evt.seqno, 2);
    assert!(!has_event(&l).unwrap());
}
