// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Basic example of toggling a single line.

use anyhow::Context;
use gpioline::{CdevLine, Direction};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let offset = 22;
    let mut value = true;

    let line = CdevLine::builder("/dev/gpiochip0", offset, Direction::High)
        .with_label("toggle-line-value")
        .open()
        .context("Failed to request line")?;

    loop {
        println!("{}={}", offset, value);
        thread::sleep(Duration::from_millis(500));
        value = !value;
        line.write(value).context("Failed to set value")?;
    }
}
