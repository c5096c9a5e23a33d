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

//! Notification service facade.
//!
//! The rest of the application only ever calls [`NotificationService::send`]
//! and [`NotificationService::close`]. Both are fire-and-forget: `send` never
//! reports delivery, and `close` returns without waiting for the backlog.
//!
//! # Example
//!
//! ```
//! use bank_mail_rs::{ChannelMailer, ClientId, Notification, NotificationService, WorkerExit};
//! use crossbeam::channel::unbounded;
//!
//! let (tx, rx) = unbounded();
//! let service = NotificationService::with_mailer(ChannelMailer::new(tx)).unwrap();
//!
//! service.send(Notification::new(ClientId(1), "bank", "Welcome", "Welcome to our bank!"));
//! service.close();
//!
//! assert_eq!(service.wait(), Some(WorkerExit::Drained { delivered: 1 }));
//! assert_eq!(rx.try_iter().count(), 1);
//! ```

use crate::error::NotificationError;
use crate::mailer::{ConsoleMailer, Mailer};
use crate::notification::Notification;
use crate::notification_queue::NotificationQueue;
use crate::worker::{NotificationWorker, WorkerExit};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Asynchronous notification dispatcher backed by a single worker thread.
///
/// # Invariants
///
/// - Notifications sent from one thread are delivered in the order sent.
/// - Every notification admitted before `close` is delivered exactly once.
/// - Notifications sent after `close` are silently dropped.
/// - `close` may be called any number of times.
#[derive(Debug)]
pub struct NotificationService {
    queue: Arc<NotificationQueue>,
    /// Taken by the first call to [`NotificationService::wait`].
    worker: Mutex<Option<NotificationWorker>>,
}

impl NotificationService {
    /// Starts a service that prints every notification to stdout.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::WorkerSpawn`] if the worker thread
    /// cannot be started.
    pub fn new() -> Result<Self, NotificationError> {
        Self::with_mailer(ConsoleMailer::stdout())
    }

    /// Starts a service that hands every notification to `mailer`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::WorkerSpawn`] if the worker thread
    /// cannot be started.
    pub fn with_mailer<M>(mailer: M) -> Result<Self, NotificationError>
    where
        M: Mailer + 'static,
    {
        let queue = Arc::new(NotificationQueue::new());
        let worker = NotificationWorker::spawn(Arc::clone(&queue), mailer)
            .map_err(NotificationError::WorkerSpawn)?;

        Ok(Self {
            queue,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queues a notification for delivery.
    ///
    /// Never blocks beyond a short critical section. After [`close`](Self::close),
    /// or once the worker has stopped, the notification is dropped without an
    /// error, since callers do not check the outcome.
    pub fn send(&self, notification: Notification) {
        let recipient = notification.recipient();
        if !self.queue.enqueue(notification) {
            debug!(%recipient, "service closed or worker stopped, notification dropped");
        }
    }

    /// Stops admitting notifications. The worker keeps delivering what is
    /// already queued and then terminates; this call does not wait for it.
    pub fn close(&self) {
        if self.queue.close() {
            info!("service closing");
        }
    }

    /// Cancels the worker at its suspension point, abandoning whatever is
    /// still queued at that moment.
    ///
    /// This is the hard stop for the owner of the service; regular shutdown
    /// goes through [`close`](Self::close).
    pub fn cancel(&self) {
        if self.queue.cancel() {
            warn!("cancelling notification worker");
        }
    }

    /// Blocks until the worker has terminated and reports how.
    ///
    /// Only the first call joins the worker. Every later call returns `None`
    /// immediately, even while the first one is still blocked waiting for the
    /// worker to finish.
    /// Blocks forever unless [`close`](Self::close) or [`cancel`](Self::cancel)
    /// has been (or will be) called.
    pub fn wait(&self) -> Option<WorkerExit> {
        let worker = self.worker.lock().take()?;
        Some(worker.join())
    }
}

impl Drop for NotificationService {
    /// Closes the queue so a detached worker still drains and exits.
    fn drop(&mut self) {
        self.queue.close();
    }
}
