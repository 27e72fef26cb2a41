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

//! Authoritative account balances.
//!
//! # Thread Safety
//!
//! Accounts live in a [`DashMap`] as `Arc<Account>`, so a lookup releases the
//! shard lock before the account's own mutex is taken. Operations touching
//! two accounts lock them in [`AccountId`] order.

use crate::account::{Account, AccountRecord};
use crate::base::AccountId;
use crate::error::AtmError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Account balances indexed by account ID.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Adds an account. Returns `false` if the ID is already present, in
    /// which case the existing account is kept untouched.
    ///
    /// # Errors
    ///
    /// [`AtmError::InvalidAmount`] for a negative opening balance.
    pub fn open(&self, record: AccountRecord) -> Result<bool, AtmError> {
        if record.balance < Decimal::ZERO {
            return Err(AtmError::InvalidAmount);
        }
        match self.accounts.entry(record.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Account::open(record)));
                Ok(true)
            }
        }
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub(crate) fn get(&self, id: &AccountId) -> Result<Arc<Account>, AtmError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AtmError::AccountNotFound(id.clone()))
    }

    pub fn balance_of(&self, id: &AccountId) -> Result<Decimal, AtmError> {
        Ok(self.get(id)?.balance())
    }

    pub fn record(&self, id: &AccountId) -> Result<AccountRecord, AtmError> {
        Ok(self.get(id)?.record())
    }

    /// Snapshots of every account, ordered by ID.
    pub fn records(&self) -> Vec<AccountRecord> {
        let mut records: Vec<AccountRecord> = self
            .accounts
            .iter()
            .map(|entry| entry.value().record())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Sum of all balances.
    pub fn total_balance(&self) -> Decimal {
        self.accounts.iter().map(|entry| entry.value().balance()).sum()
    }

    /// Takes `amount` from an account and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`AtmError::AccountNotFound`] - unknown account.
    /// - [`AtmError::InsufficientFunds`] - `amount` exceeds the balance or is not positive.
    pub fn debit(&self, id: &AccountId, amount: Decimal) -> Result<Decimal, AtmError> {
        let account = self.get(id)?;
        let mut data = account.lock();
        data.debit(amount)?;
        Ok(data.balance())
    }

    /// Adds `amount` to an account and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`AtmError::AccountNotFound`] - unknown account.
    /// - [`AtmError::InvalidAmount`] - `amount` is not positive or the balance would overflow.
    pub fn credit(&self, id: &AccountId, amount: Decimal) -> Result<Decimal, AtmError> {
        let account = self.get(id)?;
        let mut data = account.lock();
        data.credit(amount)?;
        Ok(data.balance())
    }

    /// Moves `amount` between two accounts while holding both account locks.
    ///
    /// Nothing changes unless both the debit and the credit succeed.
    ///
    /// # Errors
    ///
    /// - [`AtmError::InvalidAmount`] - `from == to`, `amount` is not positive,
    ///   or the destination balance would overflow.
    /// - [`AtmError::AccountNotFound`] - either account is unknown.
    /// - [`AtmError::InsufficientFunds`] - `amount` exceeds the source balance.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(AccountRecord, AccountRecord), AtmError> {
        self.transfer_with(from, to, amount, |_, _| {})
    }

    /// Like [`transfer`](Self::transfer), but runs `on_commit` with both new
    /// records before the account locks are released.
    pub fn transfer_with<F>(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
        on_commit: F,
    ) -> Result<(AccountRecord, AccountRecord), AtmError>
    where
        F: FnOnce(&AccountRecord, &AccountRecord),
    {
        if from == to || amount <= Decimal::ZERO {
            return Err(AtmError::InvalidAmount);
        }
        let source = self.get(from)?;
        let destination = self.get(to)?;

        // Lock in ID order so opposing transfers cannot deadlock.
        let (mut source_data, mut destination_data) = if from < to {
            let s = source.lock();
            let d = destination.lock();
            (s, d)
        } else {
            let d = destination.lock();
            let s = source.lock();
            (s, d)
        };

        source_data.debited(amount)?;
        destination_data.credited(amount)?;
        source_data.debit(amount)?;
        destination_data.credit(amount)?;

        let records = (source_data.record(), destination_data.record());
        on_commit(&records.0, &records.1);
        Ok(records)
    }
}
