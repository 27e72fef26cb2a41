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

//! Persistence collaborators.
//!
//! The engine writes through these after every mutation. Storage format is
//! up to the implementation; the in-memory stores here back tests and the
//! batch driver.

use crate::account::AccountRecord;
use crate::base::{AccountId, TransactionId};
use crate::error::StoreError;
use crate::maintenance::SoftwareVersion;
use crate::reserve::CashReserveState;
use crate::transaction::Transaction;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Durable home of account balances.
pub trait AccountStore: Send + Sync {
    fn find_by_id(&self, id: &AccountId) -> Result<Option<AccountRecord>, StoreError>;

    /// Persists the current state of an account (insert or replace).
    fn update(&self, account: &AccountRecord) -> Result<(), StoreError>;
}

/// Append-only transaction log.
pub trait TransactionStore: Send + Sync {
    fn append(&self, transaction: Transaction) -> Result<(), StoreError>;

    /// Transactions where `id` is the source or destination, in append order.
    fn find_by_account(&self, id: &AccountId) -> Result<Vec<Transaction>, StoreError>;

    fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError>;
}

/// Durable home of the machine's physical reserve and installed software.
pub trait MachineStateStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<CashReserveState>, StoreError>;

    fn save(&self, state: &CashReserveState) -> Result<(), StoreError>;

    /// `None` until a software update has been saved.
    fn load_version(&self) -> Result<Option<SoftwareVersion>, StoreError>;

    fn save_version(&self, version: SoftwareVersion) -> Result<(), StoreError>;
}

/// [`AccountStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<AccountId, AccountRecord>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountRecord>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.accounts.insert(account.id.clone(), account);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountStore for MemoryAccountStore {
    fn find_by_id(&self, id: &AccountId) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }

    fn update(&self, account: &AccountRecord) -> Result<(), StoreError> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }
}

/// [`MachineStateStore`] kept in memory; counts saves.
#[derive(Debug, Default)]
pub struct MemoryMachineStore {
    state: RwLock<Option<CashReserveState>>,
    version: RwLock<Option<SoftwareVersion>>,
    saves: AtomicUsize,
}

impl MemoryMachineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    pub fn with_state(state: CashReserveState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Last saved state.
    pub fn current(&self) -> Option<CashReserveState> {
        self.state.read().clone()
    }

    /// Last saved software version.
    pub fn version(&self) -> Option<SoftwareVersion> {
        *self.version.read()
    }
}

impl MachineStateStore for MemoryMachineStore {
    fn load(&self) -> Result<Option<CashReserveState>, StoreError> {
        Ok(self.current())
    }

    fn save(&self, state: &CashReserveState) -> Result<(), StoreError> {
        *self.state.write() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn load_version(&self) -> Result<Option<SoftwareVersion>, StoreError> {
        Ok(self.version())
    }

    fn save_version(&self, version: SoftwareVersion) -> Result<(), StoreError> {
        *self.version.write() = Some(version);
        Ok(())
    }
}
