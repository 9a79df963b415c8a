// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(dead_code)]

use std::time::Duration;

// max time to allow events to propagate from the sim to cdev
const PROPAGATION_DELAY: Duration = Duration::from_millis(10);

pub fn wait_propagation_delay() {
    std::thread::sleep(PROPAGATION_DELAY);
}

// a chip with named and hogged lines for info tests
pub fn detailed_sim() -> gpiosim::Sim {
    use gpiosim::{Bank, Direction};
    gpiosim::builder()
        .with_bank(
            Bank::new(8, "fruit")
                .name(3, "banana")
                .name(5, "apple")
                .name(7, "pear")
                .hog(2, "bowl", Direction::OutputLow)
                .hog(5, "pie", Direction::Input),
        )
        .live()
        .expect("gpiosim should go live")
}
