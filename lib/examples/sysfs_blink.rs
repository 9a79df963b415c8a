// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Example of driving a line through the sysfs interface, falling back
// from the character device when no chip is given.

use anyhow::Context;
use gpioline::{abi, Direction, Gpio};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    // usage: sysfs_blink [gpio] [chip]
    let mut args = std::env::args().skip(1);
    let gpio: u32 = match args.next() {
        Some(s) => s.parse().context("Invalid GPIO number")?,
        None => 504,
    };
    let chip = args.next().map(PathBuf::from);

    let mut line = abi::open(chip, gpio, Direction::Low).context("Failed to open line")?;
    println!("{line}");

    for _ in 0..10 {
        line.write(true)?;
        thread::sleep(Duration::from_millis(250));
        line.write(false)?;
        thread::sleep(Duration::from_millis(250));
    }
    line.close()?;
    Ok(())
}
