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

//! # ATM Ledger
//!
//! Account ledger and cash-resource engine for an automated teller machine.
//!
//! ## Core Components
//!
//! - [`Engine`]: Runs withdrawals, deposits, transfers, receipts and maintenance
//! - [`Ledger`]: Account balances with per-account locking
//! - [`CashReserveState`]: Notes, ink and paper held by the machine
//! - [`dispenser`]: Exact note allocation for withdrawals
//! - [`AtmError`]: Error types for every workflow
//!
//! ## Example
//!
//! ```
//! use atm_ledger_rs::{AccountId, AccountKind, AccountRecord, CashReserveState, Engine, NoteCounts};
//! use rust_decimal_macros::dec;
//!
//! let notes: NoteCounts = "100:1 50:2 20:5 10:5".parse().unwrap();
//! let engine = Engine::builder()
//!     .initial_reserve(CashReserveState::new(notes, 5, 6))
//!     .account(AccountRecord::new("ACC001", "USR001", AccountKind::Checking, dec!(500)))
//!     .build()
//!     .unwrap();
//!
//! let account = AccountId::from("ACC001");
//! engine.withdraw(&account, dec!(230)).unwrap();
//!
//! assert_eq!(engine.balance(&account).unwrap(), dec!(270));
//! assert_eq!(engine.reserve().total_cash(), dec!(120));
//! ```
//!
//! ## Thread Safety
//!
//! The engine is `Send + Sync`. Work on different accounts proceeds in
//! parallel; withdrawals and receipt printing serialize on the reserve.

pub mod account;
pub mod audit;
mod base;
pub mod denomination;
pub mod dispenser;
mod engine;
pub mod error;
pub mod ledger;
pub mod maintenance;
pub mod receipt;
pub mod reserve;
pub mod settings;
pub mod store;
mod transaction;

pub use account::{Account, AccountKind, AccountRecord};
pub use audit::AuditTrail;
pub use base::{AccountId, OwnerId, TransactionId};
pub use denomination::{Denomination, NoteCounts};
pub use dispenser::{CashDispenser, GreedyDispenser};
pub use engine::{Engine, EngineBuilder};
pub use error::{AtmError, Shortage, StoreError};
pub use ledger::Ledger;
pub use maintenance::{MachineStatus, MaintenancePolicy, Role, SoftwareVersion};
pub use receipt::{ReceiptPrinter, TextReceipt};
pub use reserve::CashReserveState;
pub use settings::Settings;
pub use store::{
    AccountStore, MachineStateStore, MemoryAccountStore, MemoryMachineStore, TransactionStore,
};
pub use transaction::{Transaction, TransactionKind};
