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

//! Client registry and registration listeners.
//!
//! The [`Bank`] keeps the registered clients and, on every successful
//! registration, fires its listeners synchronously and in registration order
//! before [`Bank::add_client`] returns. The built-in listeners are:
//!
//! 1. print: logs the new client.
//! 2. email notification: sends a welcome [`Notification`] through the
//!    injected [`NotificationService`], if any.
//! 3. debug: logs the full client record.
//!
//! # Thread Safety
//!
//! Clients live in a [`DashMap`]; registration of distinct clients may run
//! concurrently. The map entry is released before listeners run, so a
//! listener may read the bank.

use crate::base::ClientId;
use crate::client::Client;
use crate::error::BankError;
use crate::notification::Notification;
use crate::service::NotificationService;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Reacts to a newly registered client.
pub trait ClientRegistrationListener: Send + Sync {
    fn on_client_added(&self, client: &Client);
}

/// Ordered list of listeners fired for each registration.
#[derive(Default)]
pub struct RegistrationDispatcher {
    listeners: Vec<Box<dyn ClientRegistrationListener>>,
}

impl RegistrationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener; it fires after every listener registered before it.
    pub fn register<L>(&mut self, listener: L)
    where
        L: ClientRegistrationListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Invokes every listener once, in registration order.
    pub fn dispatch(&self, client: &Client) {
        for listener in &self.listeners {
            listener.on_client_added(client);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[derive(Debug, Default)]
struct RegistrationCounters {
    printed: AtomicUsize,
    emailed: AtomicUsize,
    debugged: AtomicUsize,
}

struct PrintClientListener {
    counters: Arc<RegistrationCounters>,
}

impl ClientRegistrationListener for PrintClientListener {
    fn on_client_added(&self, client: &Client) {
        info!(client = client.name(), id = %client.id(), "client added");
        self.counters.printed.fetch_add(1, Ordering::Relaxed);
    }
}

struct EmailNotificationListener {
    counters: Arc<RegistrationCounters>,
    notifications: Option<Arc<NotificationService>>,
}

impl EmailNotificationListener {
    const SENDER: &'static str = "bank";
    const SUBJECT: &'static str = "Welcome to our bank!";
}

impl ClientRegistrationListener for EmailNotificationListener {
    fn on_client_added(&self, client: &Client) {
        info!(client = client.name(), "notification email to be sent");

        if let Some(notifications) = &self.notifications {
            notifications.send(Notification::new(
                client.id(),
                Self::SENDER,
                Self::SUBJECT,
                format!("Dear {}, welcome to our bank!", client.greeting_name()),
            ));
        }

        // Counted whether or not a service is attached.
        self.counters.emailed.fetch_add(1, Ordering::Relaxed);
    }
}

struct DebugListener {
    counters: Arc<RegistrationCounters>,
}

impl ClientRegistrationListener for DebugListener {
    fn on_client_added(&self, client: &Client) {
        debug!(?client, "client registered");
        self.counters.debugged.fetch_add(1, Ordering::Relaxed);
    }
}

/// Registry of bank clients.
///
/// # Invariants
///
/// - Client IDs are unique; a second registration of the same ID is rejected
///   and fires no listener.
/// - Each successful registration fires every listener exactly once.
pub struct Bank {
    /// Registered clients indexed by client ID.
    clients: DashMap<ClientId, Client>,
    dispatcher: RegistrationDispatcher,
    counters: Arc<RegistrationCounters>,
}

impl Bank {
    /// Creates a bank whose email listener only counts, sending nothing.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a bank that sends a welcome notification for every new client.
    pub fn with_notifications(notifications: Arc<NotificationService>) -> Self {
        Self::build(Some(notifications))
    }

    fn build(notifications: Option<Arc<NotificationService>>) -> Self {
        let counters = Arc::new(RegistrationCounters::default());

        let mut dispatcher = RegistrationDispatcher::new();
        dispatcher.register(PrintClientListener {
            counters: Arc::clone(&counters),
        });
        dispatcher.register(EmailNotificationListener {
            counters: Arc::clone(&counters),
            notifications,
        });
        dispatcher.register(DebugListener {
            counters: Arc::clone(&counters),
        });

        Self {
            clients: DashMap::new(),
            dispatcher,
            counters,
        }
    }

    /// Adds a listener that fires after the built-in ones.
    pub fn register_listener<L>(&mut self, listener: L)
    where
        L: ClientRegistrationListener + 'static,
    {
        self.dispatcher.register(listener);
    }

    /// Registers a client and notifies every listener.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::ClientExists`] if the client ID is already taken.
    pub fn add_client(&self, client: Client) -> Result<(), BankError> {
        let client_id = client.id();

        // Entry API gives an atomic check-and-insert; the guard is dropped
        // before the listeners run.
        match self.clients.entry(client_id) {
            Entry::Occupied(_) => {
                warn!(
                    id = %client_id,
                    client = client.name(),
                    "cannot add an already existing client"
                );
                return Err(BankError::ClientExists(client_id));
            }
            Entry::Vacant(entry) => {
                entry.insert(client.clone());
            }
        }

        self.dispatcher.dispatch(&client);
        Ok(())
    }

    /// Returns a copy of the client registered under `client_id`.
    pub fn get_client(&self, client_id: &ClientId) -> Option<Client> {
        self.clients.get(client_id).map(|entry| entry.value().clone())
    }

    /// Returns a snapshot of all clients, ordered by ID.
    pub fn clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        clients.sort_by_key(Client::id);
        clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn printed_clients(&self) -> usize {
        self.counters.printed.load(Ordering::Relaxed)
    }

    pub fn emailed_clients(&self) -> usize {
        self.counters.emailed.load(Ordering::Relaxed)
    }

    pub fn debugged_clients(&self) -> usize {
        self.counters.debugged.load(Ordering::Relaxed)
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gender;
    use parking_lot::Mutex;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ClientRegistrationListener for Recorder {
        fn on_client_added(&self, client: &Client) {
            self.log.lock().push(format!("{}:{}", self.tag, client.name()));
        }
    }

    fn john() -> Client {
        Client::new(ClientId(1), "John", Gender::Male, "New York")
    }

    #[test]
    fn dispatcher_fires_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = RegistrationDispatcher::new();
        dispatcher.register(Recorder {
            tag: "first",
            log: Arc::clone(&log),
        });
        dispatcher.register(Recorder {
            tag: "second",
            log: Arc::clone(&log),
        });

        dispatcher.dispatch(&john());

        assert_eq!(*log.lock(), ["first:John", "second:John"]);
        assert_eq!(dispatcher.len(), 2);
    }

    #[test]
    fn new_bank_installs_builtin_listeners() {
        let bank = Bank::new();
        assert_eq!(bank.dispatcher.len(), 3);
        assert!(bank.is_empty());
    }

    #[test]
    fn duplicate_client_fires_no_listener() {
        let bank = Bank::new();
        bank.add_client(john()).unwrap();

        assert_eq!(bank.add_client(john()), Err(BankError::ClientExists(ClientId(1))));
        assert_eq!(bank.printed_clients(), 1);
        assert_eq!(bank.emailed_clients(), 1);
        assert_eq!(bank.debugged_clients(), 1);
    }

    #[test]
    fn registered_listener_receives_client() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bank = Bank::new();
        bank.register_listener(Recorder {
            tag: "custom",
            log: Arc::clone(&log),
        });

        bank.add_client(john()).unwrap();

        assert_eq!(*log.lock(), ["custom:John"]);
        assert_eq!(bank.get_client(&ClientId(1)), Some(john()));
        assert_eq!(bank.clients(), [john()]);
    }
}
