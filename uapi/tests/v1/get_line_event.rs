// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::wait_propagation_delay;
use gpioline_uapi::{has_event, read_event};

#[test]
fn both_edges() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let er = EventRequest {
        offset: 2,
        handleflags: HandleRequestFlags::INPUT,
        eventflags: EventRequestFlags::BOTH_EDGES,
        consumer: "get_line_event".into(),
        ..Default::default()
    };
    let l = get_line_event(&f, er).unwrap();
    assert!(!has_event(&l).unwrap());

    s.pullup(2).unwrap();
    wait_propagation_delay();
    assert!(has_event(&l).unwrap());

    let mut buf = vec![0_u64; LineEdgeEvent::u64_size()];
    assert_eq!(read_event(&l, &mut buf).unwrap(), LineEdgeEvent::u64_size());
    let evt = LineEdgeEvent::from_slice(&buf).unwrap();
    assert_eq!(evt.kind, LineEdgeEventKind::RisingEdge);

    // the event handle also reports the line value
    let mut values = LineValues::default();
    get_line_values(&l, &mut values).unwrap();
    assert_eq!(values.get(0), 1);

    s.pulldown(2).unwrap();
    wait_propagation_delay();
    read_event(&l, &mut buf).unwrap();
    let evt = LineEdgeEvent::from_slice(&buf).unwrap();
    assert_eq!(evt.kind, LineEdgeEventKind::FallingEdge);
}

#[test]
fn rising_only() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let er = EventRequest {
        offset: 1,
        handleflags: HandleRequestFlags::INPUT,
        eventflags: EventRequestFlags::RISING_EDGE,
        consumer: "get_line_event".into(),
        ..Default::default()
    };
    let l = get_line_event(&f, er).unwrap();

    s.pullup(1).unwrap();
    s.pulldown(1).unwrap();
    wait_propagation_delay();

    let mut buf = vec![0_u64; LineEdgeEvent::u64_size()];
    read_event(&l, &mut buf).unwrap();
    assert_eq!(
        LineEdgeEvent::from_slice(&buf).unwrap().kind,
        LineEdgeEventKind::RisingEdge
    );
    assert!(!has_event(&l).unwrap());
}
