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

//! Outbound notifications.

use crate::base::ClientId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One outbound message waiting to be delivered.
///
/// A notification is built once by its producer, handed to
/// [`NotificationService::send`](crate::NotificationService::send) and
/// consumed exactly once by the delivery worker. It has no identity beyond
/// structural equality and no setters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Notification {
    recipient: ClientId,
    sender: String,
    subject: String,
    body: String,
}

impl Notification {
    pub fn new(
        recipient: ClientId,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn recipient(&self) -> ClientId {
        self.recipient
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From: {}", self.sender)?;
        writeln!(f, "To: client #{}", self.recipient)?;
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}
