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

use bank_mail_rs::{Bank, Client, ClientId, Gender, NotificationService, WorkerExit};
use clap::Parser;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Bank Mail - Register clients and send their welcome notifications
///
/// Reads clients from a CSV file, registers them with the bank and prints
/// every welcome notification to stdout as the background worker delivers it.
#[derive(Parser, Debug)]
#[command(name = "bank-mail-rs")]
#[command(
    about = "Registers bank clients from a CSV and mails their welcome notifications",
    long_about = None
)]
struct Args {
    /// Path to CSV file with clients
    ///
    /// Expected format: id,name,gender,city
    /// Example: cargo run -- clients.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print registration statistics once all clients are processed
    #[arg(long)]
    statistics: bool,
}

fn main() {
    init_tracing();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let service = match NotificationService::new() {
        Ok(service) => Arc::new(service),
        Err(e) => {
            eprintln!("Error starting notification service: {}", e);
            process::exit(1);
        }
    };
    let bank = Bank::with_notifications(Arc::clone(&service));

    if let Err(e) = register_clients(&bank, BufReader::new(file)) {
        eprintln!("Error processing clients: {}", e);
        service.close();
        service.wait();
        process::exit(1);
    }

    if args.statistics {
        print_statistics(&bank);
    }

    // The worker is not a daemon: let it finish the backlog before exiting.
    service.close();
    match service.wait() {
        Some(WorkerExit::Drained { delivered }) => info!(delivered, "all notifications delivered"),
        Some(exit) => warn!(?exit, "notification worker stopped early"),
        None => {}
    }
}

/// Logs go to stderr so stdout only carries mail and statistics.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Raw CSV record matching the input format.
///
/// Fields: `id, name, gender, city`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    id: u16,
    name: String,
    gender: String,
    city: String,
}

impl CsvRecord {
    /// Converts the record into a client.
    ///
    /// Returns `None` for an unknown gender or an empty name.
    fn into_client(self) -> Option<Client> {
        let gender = match self.gender.to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => return None,
        };
        if self.name.is_empty() {
            return None;
        }

        Some(Client::new(ClientId(self.id), self.name, gender, self.city))
    }
}

/// Registers every client found in a CSV reader.
///
/// Malformed rows, invalid records and already registered clients are
/// logged and skipped. Returns the number of clients registered.
///
/// # CSV Format
///
/// ```csv
/// id,name,gender,city
/// 1,John,male,New York
/// 2,Jane,female,Los Angeles
/// ```
///
/// # Errors
///
/// Returns the CSV error wrapping the first I/O failure of the underlying
/// reader. Rows that fail to parse are not errors.
pub fn register_clients<R: Read>(bank: &Bank, reader: R) -> Result<usize, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let mut registered = 0;
    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!(error = %e, "skipping malformed row");
                continue;
            }
        };

        let Some(client) = record.into_client() else {
            warn!("skipping invalid client record");
            continue;
        };

        // Duplicates are already logged by the bank.
        if bank.add_client(client).is_ok() {
            registered += 1;
        }
    }

    Ok(registered)
}

fn print_statistics(bank: &Bank) {
    println!("[statistics] Number of clients: {}", bank.len());
    println!("[statistics] Printed clients: {}", bank.printed_clients());
    println!("[statistics] Emailed clients: {}", bank.emailed_clients());
    println!("[statistics] Debugged clients: {}", bank.debugged_clients());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_single_client() {
        let csv = "id,name,gender,city\n1,John,male,New York\n";
        let bank = Bank::new();

        assert_eq!(register_clients(&bank, Cursor::new(csv)).unwrap(), 1);

        let client = bank.get_client(&ClientId(1)).unwrap();
        assert_eq!(client.name(), "John");
        assert_eq!(client.gender(), Gender::Male);
        assert_eq!(client.city(), "New York");
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "id,name,gender,city\n 2 , Jane , Female , Los Angeles \n";
        let bank = Bank::new();

        register_clients(&bank, Cursor::new(csv)).unwrap();

        let client = bank.get_client(&ClientId(2)).unwrap();
        assert_eq!(client.name(), "Jane");
        assert_eq!(client.gender(), Gender::Female);
        assert_eq!(client.city(), "Los Angeles");
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "id,name,gender,city\n\
                   1,John,male,New York\n\
                   not-a-number,Bob,male,Boston\n\
                   3,Ann,unknown,Paris\n\
                   4,Jane,f,Los Angeles\n";
        let bank = Bank::new();

        assert_eq!(register_clients(&bank, Cursor::new(csv)).unwrap(), 2);
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn duplicates_are_not_counted() {
        let csv = "id,name,gender,city\n\
                   1,John,male,New York\n\
                   1,John,male,New York\n";
        let bank = Bank::new();

        assert_eq!(register_clients(&bank, Cursor::new(csv)).unwrap(), 1);
        assert_eq!(bank.emailed_clients(), 1);
    }

    #[test]
    fn every_registration_sends_a_welcome() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let mailer = bank_mail_rs::ChannelMailer::new(tx);
        let service = Arc::new(NotificationService::with_mailer(mailer).unwrap());
        let bank = Bank::with_notifications(Arc::clone(&service));

        let csv = "id,name,gender,city\n1,John,male,New York\n2,Jane,female,Los Angeles\n";
        register_clients(&bank, Cursor::new(csv)).unwrap();
        service.close();

        assert_eq!(service.wait(), Some(WorkerExit::Drained { delivered: 2 }));
        let recipients: Vec<_> = rx.try_iter().map(|n| n.recipient()).collect();
        assert_eq!(recipients, [ClientId(1), ClientId(2)]);
    }

    #[test]
    fn reader_failure_is_returned() {
        struct FailingReader;

        impl Read for FailingReader {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let bank = Bank::new();
        let error = register_clients(&bank, FailingReader).unwrap_err();

        assert!(error.is_io_error());
        assert!(bank.is_empty());
    }
}
