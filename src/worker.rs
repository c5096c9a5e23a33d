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

//! The background delivery worker.
//!
//! ```text
//!  ┌──────────┐  Notification   ┌─────────┐
//!  │ Draining │ ──────────────► │ deliver │ ─┐
//!  └──────────┘ ◄────────────── └─────────┘  │
//!       │  Shutdown / Cancelled                │
//!       ▼                                      │
//!  ┌────────────┐                              │
//!  │ Terminated │ ◄── (no way back) ───────────┘
//!  └────────────┘
//! ```
//!
//! One worker is spawned per [`NotificationService`](crate::NotificationService)
//! and is never restarted.

use crate::mailer::Mailer;
use crate::notification_queue::{Dequeued, NotificationQueue};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// How the delivery worker terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue was closed and everything admitted before that was delivered.
    Drained { delivered: u64 },
    /// The worker was cancelled at its suspension point; anything still
    /// queued was abandoned.
    Cancelled { delivered: u64 },
    /// The mailer panicked during a delivery.
    Panicked,
}

impl WorkerExit {
    /// Number of notifications delivered before termination, if known.
    pub fn delivered(&self) -> Option<u64> {
        match self {
            Self::Drained { delivered } | Self::Cancelled { delivered } => Some(*delivered),
            Self::Panicked => None,
        }
    }
}

/// Handle to the running worker thread.
#[derive(Debug)]
pub(crate) struct NotificationWorker {
    handle: JoinHandle<WorkerExit>,
}

impl NotificationWorker {
    const THREAD_NAME: &'static str = "notification-worker";

    /// Starts draining `queue` into `mailer` on a dedicated thread.
    pub(crate) fn spawn<M>(queue: Arc<NotificationQueue>, mailer: M) -> io::Result<Self>
    where
        M: Mailer + 'static,
    {
        let handle = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(move || run(&queue, mailer))?;

        Ok(Self { handle })
    }

    /// Blocks until the worker thread has terminated.
    pub(crate) fn join(self) -> WorkerExit {
        self.handle.join().unwrap_or_else(|_| {
            error!("notification worker panicked");
            WorkerExit::Panicked
        })
    }
}

/// Marks the queue terminated when the worker leaves `run`, unwinding included.
struct TerminationGuard<'a> {
    queue: &'a NotificationQueue,
}

impl Drop for TerminationGuard<'_> {
    fn drop(&mut self) {
        self.queue.terminate();
    }
}

fn run<M: Mailer>(queue: &NotificationQueue, mut mailer: M) -> WorkerExit {
    let _guard = TerminationGuard { queue };
    debug!(mailer = mailer.name(), "notification worker started");
    let mut delivered = 0u64;

    loop {
        match queue.next() {
            Dequeued::Notification(notification) => {
                mailer.deliver(&notification);
                delivered += 1;
                info!(
                    recipient = %notification.recipient(),
                    subject = notification.subject(),
                    "notification delivered"
                );
            }
            Dequeued::Shutdown => {
                debug!(delivered, "notification worker drained");
                return WorkerExit::Drained { delivered };
            }
            Dequeued::Cancelled => {
                warn!(delivered, "notification worker cancelled");
                return WorkerExit::Cancelled { delivered };
            }
        }
    }
}
