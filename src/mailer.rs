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

//! Delivery side effects.
//!
//! The worker hands every dequeued [`Notification`] to a [`Mailer`]. The
//! reference behavior is [`ConsoleMailer`]; a real mail transport plugs in
//! at the same seam.

use crate::notification::Notification;
use crossbeam::channel::Sender;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Performs the delivery of one notification.
///
/// Delivery cannot fail as far as the worker is concerned: implementations
/// handle (or log) their own errors. A `Mailer` is owned by exactly one
/// worker thread, hence `&mut self`.
pub trait Mailer: Send {
    fn deliver(&mut self, notification: &Notification);

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Writes each notification to a text sink, stdout by default.
#[derive(Debug)]
pub struct ConsoleMailer<W = io::Stdout> {
    out: W,
}

impl ConsoleMailer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleMailer<io::Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> ConsoleMailer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_notification(&mut self, notification: &Notification) -> io::Result<()> {
        writeln!(self.out, "--- Sending email:")?;
        writeln!(self.out, "{notification}")?;
        self.out.flush()
    }
}

impl<W: Write + Send> Mailer for ConsoleMailer<W> {
    fn deliver(&mut self, notification: &Notification) {
        if let Err(e) = self.write_notification(notification) {
            warn!(
                error = %e,
                recipient = %notification.recipient(),
                "failed to write notification"
            );
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Forwards delivered notifications into a channel.
///
/// Lets an embedding application (or a test) observe exactly what the
/// worker delivered, and in which order.
#[derive(Debug, Clone)]
pub struct ChannelMailer {
    sender: Sender<Notification>,
}

impl ChannelMailer {
    pub fn new(sender: Sender<Notification>) -> Self {
        Self { sender }
    }
}

impl Mailer for ChannelMailer {
    fn deliver(&mut self, notification: &Notification) {
        if self.sender.send(notification.clone()).is_err() {
            debug!(recipient = %notification.recipient(), "delivery receiver is gone");
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
