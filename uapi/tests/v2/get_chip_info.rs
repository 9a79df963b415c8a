// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::*;
use crate::common::detailed_sim;

#[test]
fn check_info() {
    let sim = detailed_sim();
    for sc in sim.chips() {
        let f = fs::File::open(sc.dev_path()).unwrap();
        let info = get_chip_info(&f).unwrap();
        assert_eq!(info.num_lines, sc.config().num_lines);
        assert_eq!(String::from(&info.label), sc.config().label);
        assert_eq!(String::from(&info.name), sc.chip_name);
    }
}

#[test]
fn on_simpleton() {
    let s = Simpleton::new(4);
    let f = fs::File::open(s.dev_path()).unwrap();
    let info = get_chip_info(&f).unwrap();
    assert_eq!(info.num_lines, 4);
    assert!(!info.name.is_empty());
}
