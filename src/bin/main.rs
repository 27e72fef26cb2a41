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

use atm_ledger_rs::{
    AccountId, AtmError, Engine, NoteCounts, ReceiptPrinter, Role, Settings, SoftwareVersion,
    TextReceipt,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// ATM Ledger - Replay teller operations against a configured machine
///
/// Reads operations from a CSV file and outputs account states to stdout.
/// Supports withdrawals, deposits, transfers, balance inquiries and
/// technician maintenance.
#[derive(Parser, Debug)]
#[command(name = "atm-ledger-rs")]
#[command(about = "An ATM engine that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,to,amount,detail
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Machine configuration file (defaults to ./atm.toml when present)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print a receipt to stderr after each successful customer operation
    #[arg(long)]
    receipts: bool,

    /// Print the machine status report to stderr once all operations ran
    #[arg(long)]
    status: bool,
}

fn main() {
    let args = Args::parse();

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.machine.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = match build_engine(&settings) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error configuring machine: {}", e);
            process::exit(1);
        }
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let mut printer = TextReceipt::new(std::io::stderr());
    let receipts: Option<&mut dyn ReceiptPrinter> = if args.receipts {
        Some(&mut printer)
    } else {
        None
    };

    if let Err(e) = process_operations(&engine, BufReader::new(file), receipts) {
        eprintln!("Error processing operations: {}", e);
        process::exit(1);
    }

    if args.status {
        eprint!("{}", engine.status());
    }

    if let Err(e) = write_accounts(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Builds the engine described by `settings`.
pub fn build_engine(settings: &Settings) -> Result<Engine, Box<dyn std::error::Error>> {
    let mut builder = Engine::builder()
        .machine_id(settings.machine.id.clone())
        .software_version(settings.software_version()?)
        .initial_reserve(settings.reserve.to_state()?);
    for record in &settings.accounts {
        builder = builder.account(record.clone());
    }
    Ok(builder.build()?)
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, to, amount, detail`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    to: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    detail: String,
}

/// One replayable operation.
#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Withdraw(AccountId, Decimal),
    Deposit(AccountId, Decimal),
    Transfer(AccountId, AccountId, Decimal),
    Balance(AccountId),
    Replenish(NoteCounts),
    RefillInk,
    RestockPaper(u32),
    UpdateSoftware(SoftwareVersion),
}

impl CsvRecord {
    /// Converts a CSV record to an [`Operation`].
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let account = || (!self.account.is_empty()).then(|| AccountId::new(self.account.clone()));

        match self.op.to_lowercase().as_str() {
            "withdraw" | "withdrawal" => Some(Operation::Withdraw(account()?, self.amount?)),
            "deposit" => Some(Operation::Deposit(account()?, self.amount?)),
            "transfer" => {
                let to = (!self.to.is_empty()).then(|| AccountId::new(self.to.clone()))?;
                Some(Operation::Transfer(account()?, to, self.amount?))
            }
            "balance" => Some(Operation::Balance(account()?)),
            "replenish" => self.detail.parse().ok().map(Operation::Replenish),
            "refill_ink" => Some(Operation::RefillInk),
            "restock_paper" => {
                let sheets = self.amount?.to_u32()?;
                Some(Operation::RestockPaper(sheets))
            }
            "update_software" => self.detail.parse().ok().map(Operation::UpdateSoftware),
            _ => None,
        }
    }
}

/// Runs one operation. Maintenance rows act with the technician role.
fn apply(
    engine: &Engine,
    operation: Operation,
    printer: Option<&mut dyn ReceiptPrinter>,
) -> Result<(), AtmError> {
    let transaction = match operation {
        Operation::Withdraw(account, amount) => engine.withdraw(&account, amount)?,
        Operation::Deposit(account, amount) => engine.deposit(&account, amount)?,
        Operation::Transfer(from, to, amount) => engine.transfer(&from, &to, amount)?,
        Operation::Balance(account) => {
            match printer {
                Some(printer) => engine.print_balance_receipt(&account, printer)?,
                None => engine.balance(&account)?,
            };
            return Ok(());
        }
        Operation::Replenish(notes) => {
            engine.replenish_cash(Role::Technician, &notes)?;
            return Ok(());
        }
        Operation::RefillInk => {
            engine.refill_ink(Role::Technician)?;
            return Ok(());
        }
        Operation::RestockPaper(sheets) => {
            engine.restock_paper(Role::Technician, sheets)?;
            return Ok(());
        }
        Operation::UpdateSoftware(version) => {
            engine.update_software(Role::Technician, version)?;
            return Ok(());
        }
    };

    if let Some(printer) = printer {
        // Out of ink or paper does not undo a committed transaction.
        if let Err(e) = engine.print_receipt(&transaction, printer) {
            warn!(tx = %transaction.id(), "no receipt: {e}");
        }
    }
    Ok(())
}

/// Replays operations from a CSV reader against `engine`.
///
/// Streams the input row by row. Malformed rows and rejected operations are
/// logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `op, account, to, amount, detail`
/// - `op`: withdraw, deposit, transfer, balance, replenish, refill_ink,
///   restock_paper, update_software
/// - `account`: Source or target account
/// - `to`: Destination account (transfer only)
/// - `amount`: Decimal amount, or sheet count for restock_paper
/// - `detail`: Note list for replenish (`100:2 50:1`), version for update_software
///
/// # Example
///
/// ```csv
/// op,account,to,amount,detail
/// deposit,ACC001,,100.00,
/// withdraw,ACC001,,50,
/// transfer,ACC001,ACC002,25.00,
/// replenish,,,,100:2 50:4
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_operations<R: Read>(
    engine: &Engine,
    reader: R,
    mut printer: Option<&mut dyn ReceiptPrinter>,
) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, "skipping malformed row: {e}");
                continue;
            }
        };

        let Some(operation) = record.into_operation() else {
            warn!(row, "skipping invalid operation");
            continue;
        };

        debug!(row, ?operation, "applying");
        let receipts: Option<&mut dyn ReceiptPrinter> = match printer {
            Some(ref mut p) => Some(&mut **p),
            None => None,
        };
        if let Err(e) = apply(engine, operation, receipts) {
            warn!(row, "operation rejected: {e}");
        }
    }

    Ok(())
}

/// Write account states to a CSV writer
///
/// # CSV Format
///
/// Columns: `account, owner, kind, balance`
///
/// # Example
///
/// ```csv
/// account,owner,kind,balance
/// ACC001,USR001,checking,270.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in engine.accounts() {
        wtr.serialize(&account)?;
    }

    wtr.flush()?;
    Ok(())
}
