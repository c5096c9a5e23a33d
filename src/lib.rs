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

//! # Bank Mail
//!
//! An in-memory bank client registry that greets every new client through an
//! asynchronous notification dispatcher.
//!
//! ## Core Components
//!
//! - [`NotificationService`]: Facade with fire-and-forget `send` and `close`
//! - [`Notification`]: Immutable outbound message
//! - [`Mailer`]: Delivery side effect run by the background worker
//! - [`Bank`]: Client registry firing [`ClientRegistrationListener`]s on registration
//! - [`BankError`]: Registration errors
//!
//! ## Example
//!
//! ```
//! use bank_mail_rs::{Bank, ChannelMailer, Client, ClientId, Gender, NotificationService};
//! use crossbeam::channel::unbounded;
//! use std::sync::Arc;
//!
//! let (tx, rx) = unbounded();
//! let service = Arc::new(NotificationService::with_mailer(ChannelMailer::new(tx)).unwrap());
//! let bank = Bank::with_notifications(Arc::clone(&service));
//!
//! bank.add_client(Client::new(ClientId(1), "Jane", Gender::Female, "Los Angeles")).unwrap();
//!
//! // Everything admitted before close is still delivered.
//! service.close();
//! service.wait();
//!
//! let welcome = rx.recv().unwrap();
//! assert_eq!(welcome.recipient(), ClientId(1));
//! assert_eq!(welcome.subject(), "Welcome to our bank!");
//! ```
//!
//! ## Concurrency
//!
//! A single worker thread drains an unbounded, mutex and condition variable
//! guarded queue. Any number of threads may send. Closing stops admission and
//! lets the worker finish the backlog before it exits.

pub mod bank;
mod base;
mod client;
pub mod error;
pub mod mailer;
mod notification;
mod notification_queue;
mod service;
mod worker;

pub use bank::{Bank, ClientRegistrationListener, RegistrationDispatcher};
pub use base::ClientId;
pub use client::{Client, Gender};
pub use error::{BankError, NotificationError};
pub use mailer::{ChannelMailer, ConsoleMailer, Mailer};
pub use notification::Notification;
pub use service::NotificationService;
pub use worker::WorkerExit;
