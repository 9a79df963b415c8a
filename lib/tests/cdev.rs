// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use gpioline::{AbiVersion, Bias, CdevLine, Direction, Drive, Edge, EdgeKind, Error, ErrorKind, Gpio};
use gpiosim::{Level, Simpleton};
use std::time::Duration;

mod common;
use common::{wait_propagation_delay, EVENT_WAIT_TIMEOUT};

fn open(s: &Simpleton, offset: u32, direction: Direction, abiv: AbiVersion) -> CdevLine {
    CdevLine::builder(s.dev_path(), offset, direction)
        .using_abi_version(abiv)
        .open()
        .unwrap()
}

mod uapi_v1 {
    crate::common_tests! {
        gpioline::AbiVersion::V1,
        read_input,
        write_output,
        initial_levels,
        loopback,
        set_direction,
        set_edge,
        set_inverted,
        set_bias,
        set_drive,
        edge_events,
        poll_timeout,
        names,
        open_by_name,
        close,
        busy_line
    }
}

mod uapi_v2 {
    crate::common_tests! {
        gpioline::AbiVersion::V2,
        read_input,
        write_output,
        initial_levels,
        loopback,
        set_direction,
        set_edge,
        set_inverted,
        set_bias,
        set_drive,
        edge_events,
        poll_timeout,
        names,
        open_by_name,
        close,
        busy_line
    }
}

fn read_input(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let offset = 2;
    let l = open(&s, offset, Direction::In, abiv);
    assert_eq!(l.abi_version(), abiv);
    assert_eq!(l.offset(), offset);
    assert_eq!(l.chip_path(), s.dev_path());

    s.pullup(offset).unwrap();
    wait_propagation_delay();
    assert!(l.read().unwrap());
    s.pulldown(offset).unwrap();
    wait_propagation_delay();
    assert!(!l.read().unwrap());

    assert_eq!(
        l.write(true),
        Err(Error::InvalidOperation("cannot write to input GPIO"))
    );
}

fn write_output(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let offset = 1;
    let l = open(&s, offset, Direction::Out, abiv);
    assert_eq!(l.direction(), Direction::Out);
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
    l.write(true).unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);
    assert!(l.read().unwrap());
    l.write(false).unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
    assert!(!l.read().unwrap());
}

fn initial_levels(abiv: AbiVersion) {
    let s = Simpleton::new(4);

    // high and low are physical levels, independent of polarity
    for (direction, inverted, level) in [
        (Direction::High, false, Level::High),
        (Direction::Low, false, Level::Low),
        (Direction::High, true, Level::High),
        (Direction::Low, true, Level::Low),
        (Direction::Out, false, Level::Low),
    ] {
        let l = CdevLine::builder(s.dev_path(), 3, direction)
            .with_inverted(inverted)
            .using_abi_version(abiv)
            .open()
            .unwrap();
        assert_eq!(s.get_level(3).unwrap(), level, "{direction} {inverted}");
        assert_eq!(l.direction(), Direction::Out);
        assert_eq!(l.read().unwrap(), (level == Level::High) ^ inverted);
    }
}

fn loopback(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let l = CdevLine::builder(s.dev_path(), 0, Direction::In)
        .as_inverted()
        .using_abi_version(abiv)
        .open()
        .unwrap();
    s.pullup(0).unwrap();
    wait_propagation_delay();
    assert!(!l.read().unwrap());
    s.pulldown(0).unwrap();
    wait_propagation_delay();
    assert!(l.read().unwrap());
}

fn set_direction(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let offset = 2;
    let mut l = CdevLine::builder(s.dev_path(), offset, Direction::In)
        .with_edge(Edge::Both)
        .using_abi_version(abiv)
        .open()
        .unwrap();
    assert_eq!(l.edge(), Edge::Both);

    l.set_direction(Direction::High).unwrap();
    assert_eq!(l.direction(), Direction::Out);
    assert_eq!(l.edge(), Edge::None);
    assert_eq!(s.get_level(offset).unwrap(), Level::High);

    l.set_drive(Drive::OpenDrain).unwrap();
    l.set_direction(Direction::Low).unwrap();
    assert_eq!(l.drive(), Drive::OpenDrain);
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);

    // returning to input resets the drive
    l.set_direction(Direction::In).unwrap();
    assert_eq!(l.direction(), Direction::In);
    assert_eq!(l.drive(), Drive::Default);
    s.pullup(offset).unwrap();
    wait_propagation_delay();
    assert!(l.read().unwrap());

    // no change is a no-op
    l.set_direction(Direction::In).unwrap();
    assert_eq!(Gpio::direction(&l).unwrap(), Direction::In);
}

fn set_edge(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let mut l = open(&s, 1, Direction::In, abiv);
    assert_eq!(l.edge(), Edge::None);
    l.set_edge(Edge::Rising).unwrap();
    assert_eq!(l.edge(), Edge::Rising);
    l.set_edge(Edge::None).unwrap();
    assert_eq!(l.edge(), Edge::None);

    l.set_direction(Direction::Out).unwrap();
    let e = l.set_edge(Edge::Both).unwrap_err();
    assert_eq!(e, Error::InvalidOperation("cannot set edge on output GPIO"));
    assert_eq!(e.kind(), ErrorKind::Unsupported);
    assert_eq!(l.edge(), Edge::None);
}

fn set_inverted(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let mut l = open(&s, 1, Direction::In, abiv);
    s.pullup(1).unwrap();
    wait_propagation_delay();
    assert!(l.read().unwrap());
    l.set_inverted(true).unwrap();
    assert!(l.inverted());
    assert!(!l.read().unwrap());
    l.set_inverted(false).unwrap();
    assert!(l.read().unwrap());
}

fn set_bias(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let mut l = open(&s, 1, Direction::In, abiv);
    l.set_bias(Bias::PullUp).unwrap();
    assert_eq!(l.bias(), Bias::PullUp);
    wait_propagation_delay();
    assert!(l.read().unwrap());
    l.set_bias(Bias::PullDown).unwrap();
    assert_eq!(l.bias(), Bias::PullDown);
    wait_propagation_delay();
    assert!(!l.read().unwrap());
}

fn set_drive(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let mut l = open(&s, 1, Direction::In, abiv);
    assert_eq!(
        l.set_drive(Drive::OpenSource),
        Err(Error::InvalidOperation("cannot set line drive on input GPIO"))
    );
    // the default is always acceptable
    l.set_drive(Drive::Default).unwrap();

    l.set_direction(Direction::Out).unwrap();
    l.set_drive(Drive::OpenSource).unwrap();
    assert_eq!(l.drive(), Drive::OpenSource);
    assert_eq!(Gpio::drive(&l).unwrap(), Drive::OpenSource);
}

fn edge_events(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let offset = 2;
    let l = CdevLine::builder(s.dev_path(), offset, Direction::In)
        .with_edge(Edge::Both)
        .using_abi_version(abiv)
        .open()
        .unwrap();
    assert!(!l.poll(Some(Duration::ZERO)).unwrap());

    s.pullup(offset).unwrap();
    assert!(l.poll(Some(EVENT_WAIT_TIMEOUT)).unwrap());
    let evt = l.read_event().unwrap();
    assert_eq!(evt.kind, EdgeKind::Rising);
    let ts = evt.timestamp_ns;

    s.pulldown(offset).unwrap();
    assert!(l.poll(Some(EVENT_WAIT_TIMEOUT)).unwrap());
    let evt = l.read_event().unwrap();
    assert_eq!(evt.kind, EdgeKind::Falling);
    assert!(evt.timestamp_ns > ts);

    assert!(!l.poll(Some(Duration::ZERO)).unwrap());
}

fn poll_timeout(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let l = open(&s, 0, Direction::In, abiv);
    assert_eq!(
        l.read_event(),
        Err(Error::InvalidOperation("GPIO edge not set"))
    );
    let start = std::time::Instant::now();
    assert!(!l.poll(Some(EVENT_WAIT_TIMEOUT)).unwrap());
    assert!(start.elapsed() >= EVENT_WAIT_TIMEOUT);

    let l = open(&s, 1, Direction::Out, abiv);
    assert_eq!(
        l.poll(Some(Duration::ZERO)),
        Err(Error::InvalidOperation("cannot poll output GPIO"))
    );
}

fn names(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let l = CdevLine::builder(s.dev_path(), 3, Direction::In)
        .with_label("tester")
        .using_abi_version(abiv)
        .open()
        .unwrap();
    assert_eq!(l.name().unwrap(), "");
    assert_eq!(l.label().unwrap(), "tester");
    assert_eq!(
        l.chip_name().unwrap().as_str(),
        s.dev_path().file_name().unwrap()
    );
    assert_eq!(l.chip_label().unwrap(), s.config().label);

    let desc = l.to_string();
    assert!(desc.starts_with("GPIO 3 (name=\"\", label=\"tester\""));
    assert!(desc.contains("direction=in"));
    assert!(desc.ends_with("type=cdev)"));
}

fn open_by_name(abiv: AbiVersion) {
    let sim = gpiosim::builder()
        .with_bank(gpiosim::Bank::new(8, "fruit").name(4, "banana"))
        .live()
        .unwrap();
    let sc = &sim.chips()[0];
    let l = CdevLine::builder(sc.dev_path(), "banana", Direction::In)
        .using_abi_version(abiv)
        .open()
        .unwrap();
    assert_eq!(l.offset(), 4);
    assert_eq!(l.name().unwrap(), "banana");

    let e = CdevLine::builder(sc.dev_path(), "kiwi", Direction::In)
        .using_abi_version(abiv)
        .open()
        .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Lookup);
}

fn close(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let mut l = open(&s, 1, Direction::High, abiv);
    assert!(l.fd().is_some());
    assert!(l.chip_fd().is_some());
    l.close();
    assert!(l.fd().is_none());
    assert!(l.chip_fd().is_none());
    assert_eq!(l.direction(), Direction::In);
    assert_eq!(l.edge(), Edge::None);
    l.close();
    Gpio::close(&mut l).unwrap();

    assert_eq!(
        l.read(),
        Err(Error::InvalidOperation("line is not requested"))
    );
    assert_eq!(
        l.set_inverted(true),
        Err(Error::InvalidOperation("line is closed"))
    );
    assert!(l.to_string().contains("line_fd=-1"));

    // the line is released
    let l2 = open(&s, 1, Direction::In, abiv);
    assert_eq!(l2.offset(), 1);
}

fn busy_line(abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let _l = open(&s, 2, Direction::In, abiv);
    let e = CdevLine::builder(s.dev_path(), 2, Direction::In)
        .using_abi_version(abiv)
        .open()
        .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);

    let e = CdevLine::builder(s.dev_path(), 4, Direction::In)
        .using_abi_version(abiv)
        .open()
        .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);
}
