// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Basic example of watching for edge events on a single line.

use anyhow::Context;
use gpioline::{CdevLine, Direction, Edge};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // request the line with edge detection to receive events
    let line = CdevLine::builder("/dev/gpiochip0", 23, Direction::In)
        .with_label("watch-line-edges")
        .with_edge(Edge::Both)
        .open()
        .context("Failed to request line")?;
    println!("{line}");

    loop {
        if line.poll(Some(Duration::from_secs(1)))? {
            let evt = line.read_event()?;
            println!("{} at {}ns", evt.kind, evt.timestamp_ns);
        } else {
            println!("no edge, value is {}", line.read()?);
        }
    }
}
