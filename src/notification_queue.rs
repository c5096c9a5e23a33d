// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Monitor-guarded FIFO of pending notifications.
//!
//! The queue owns one lock and one wake-up signal. Producers append under the
//! lock and wake the consumer; the single consumer removes from the front and
//! suspends on the condition variable while there is nothing to do.
//!
//! Emptiness is checked before the `closed` flag, so everything admitted
//! before [`NotificationQueue::close`] is still handed out afterwards.

use crate::notification::Notification;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::debug;

/// Outcome of [`NotificationQueue::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dequeued {
    /// The front of the queue.
    Notification(Notification),
    /// The queue is closed and fully drained.
    Shutdown,
    /// The consumer was cancelled at its suspension point.
    Cancelled,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Notification>,
    /// Flips to `true` once and never back.
    closed: bool,
    cancelled: bool,
    /// Set once the consumer has exited, for whatever reason.
    terminated: bool,
}

/// Unbounded, lock-protected notification queue with drain-on-close semantics.
#[derive(Debug, Default)]
pub(crate) struct NotificationQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl NotificationQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a notification and wakes the consumer.
    ///
    /// Returns `false`, leaving the queue untouched, once the queue is closed
    /// or the consumer has exited.
    pub(crate) fn enqueue(&self, notification: Notification) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.terminated {
            return false;
        }
        state.pending.push_back(notification);
        self.available.notify_one();
        true
    }

    /// Removes the front notification, suspending while the queue is empty
    /// and still open.
    ///
    /// A pending item is returned even after close. Cancellation is only
    /// observed when the queue is empty or right after a wake-up, in which
    /// case it wins over anything that arrived in the meantime.
    pub(crate) fn next(&self) -> Dequeued {
        let mut state = self.state.lock();
        loop {
            if let Some(notification) = state.pending.pop_front() {
                return Dequeued::Notification(notification);
            }
            if state.closed {
                return Dequeued::Shutdown;
            }
            if state.cancelled {
                return Dequeued::Cancelled;
            }

            debug!("waiting for work");
            self.available.wait(&mut state);

            if state.cancelled {
                return Dequeued::Cancelled;
            }
        }
    }

    /// Stops admitting notifications and wakes a suspended consumer.
    ///
    /// Returns `true` only for the call that actually closed the queue.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.closed;
        state.closed = true;
        self.available.notify_all();
        first
    }

    /// Asks the consumer to stop at its next suspension point without draining.
    ///
    /// Returns `true` only for the call that set the flag.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.cancelled;
        state.cancelled = true;
        self.available.notify_all();
        first
    }

    /// Records that the consumer is gone: nothing is admitted any more and
    /// whatever is still pending is discarded.
    pub(crate) fn terminate(&self) {
        let mut state = self.state.lock();
        state.terminated = true;
        state.pending.clear();
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}
