// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Action, Error, Result};
use std::os::unix::prelude::{AsRawFd, BorrowedFd};
use std::time::Duration;

/// A line session that can be waited on by [`poll_multiple`].
pub trait Pollable {
    /// The descriptor to wait on, or None if the session is closed.
    fn poll_fd(&self) -> Option<BorrowedFd<'_>>;

    /// The poll events that indicate an edge on the line.
    fn poll_events(&self) -> i16;

    /// Called after the descriptor has been reported ready.
    fn after_wake(&mut self) -> Result<()>;
}

/// Wait for an edge on any of a set of lines.
///
/// Returns the indices, into `lines`, of the lines that are ready,
/// in ascending order.  Events are not consumed.
///
/// A `timeout` of None blocks indefinitely, while a zero duration returns immediately.
pub fn poll_multiple(
    lines: &mut [&mut dyn Pollable],
    timeout: Option<Duration>,
) -> Result<Vec<usize>> {
    let mut pfds = Vec::with_capacity(lines.len());
    for l in lines.iter() {
        let fd = l
            .poll_fd()
            .ok_or(Error::InvalidOperation("line is not open"))?;
        pfds.push(libc::pollfd {
            fd: fd.as_raw_fd(),
            events: l.poll_events(),
            revents: 0,
        });
    }
    // SAFETY: pfds is valid for pfds.len() entries for the duration of the call.
    let n = unsafe {
        libc::poll(
            pfds.as_mut_ptr(),
            pfds.len() as libc::nfds_t,
            timeout_ms(timeout),
        )
    };
    if n < 0 {
        return Err(Error::from_errno(Action::Poll));
    }
    let mut ready = Vec::with_capacity(n as usize);
    for (idx, pfd) in pfds.iter().enumerate() {
        if pfd.revents != 0 {
            lines[idx].after_wake()?;
            ready.push(idx);
        }
    }
    tracing::trace!(?ready, "poll_multiple");
    Ok(ready)
}

/// Wait for any of the events on a single descriptor.
pub(crate) fn poll_one(fd: BorrowedFd<'_>, events: i16, timeout: Option<Duration>) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd: fd.as_raw_fd(),
        events,
        revents: 0,
    };
    // SAFETY: pfd is a single valid pollfd for the duration of the call.
    match unsafe { libc::poll(&mut pfd, 1, timeout_ms(timeout)) } {
        -1 => Err(Error::from_errno(Action::Poll)),
        0 => Ok(false),
        _ => Ok(true),
    }
}

/// Convert an optional timeout to the millisecond form used by poll.
///
/// None maps to -1, blocking indefinitely.  Partial milliseconds round up
/// so short waits are not turned into non-blocking polls.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(d) => {
            let mut ms = d.as_millis();
            if d.subsec_nanos() % 1_000_000 != 0 {
                ms += 1;
            }
            ms.min(i32::MAX as u128) as i32
        }
    }
}
