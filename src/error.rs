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

//! Error types for client registration and the notification service.

use crate::base::ClientId;
use std::io;
use thiserror::Error;

/// Client registration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// A client with the same ID is already registered
    #[error("client {0} already exists")]
    ClientExists(ClientId),
}

/// Notification service errors.
///
/// Sending and closing never fail; only starting the service can.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The delivery worker thread could not be spawned
    #[error("failed to spawn notification worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}
