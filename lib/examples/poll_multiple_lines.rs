// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Example of waiting for edges on several lines at once.

use anyhow::Context;
use gpioline::poll::{poll_multiple, Pollable};
use gpioline::{CdevLine, Direction, Edge};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let offsets = [5, 6, 23];
    let mut lines = Vec::new();
    for offset in offsets {
        let line = CdevLine::builder("/dev/gpiochip0", offset, Direction::In)
            .with_label("poll-multiple-lines")
            .with_edge(Edge::Both)
            .open()
            .with_context(|| format!("Failed to request line {offset}"))?;
        lines.push(line);
    }

    loop {
        let mut pollables: Vec<&mut dyn Pollable> =
            lines.iter_mut().map(|l| l as &mut dyn Pollable).collect();
        let ready = poll_multiple(&mut pollables, None)?;
        for idx in ready {
            let evt = lines[idx].read_event()?;
            println!("{}: {} at {}ns", offsets[idx], evt.kind, evt.timestamp_ns);
        }
    }
}
