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

//! Account management.
//!
//! An [`Account`] is the ledger's live entry; its balance sits behind a
//! mutex so debits and credits on one account are serialized. An
//! [`AccountRecord`] is the plain snapshot handed to persistence.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use atm_ledger_rs::{Account, AccountKind, AccountRecord};
//!
//! let account = Account::open(AccountRecord::new("ACC001", "USR001", AccountKind::Checking, dec!(200)));
//! assert_eq!(account.balance(), dec!(200.00));
//! ```

use crate::base::{AccountId, OwnerId};
use crate::error::AtmError;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Checking => f.write_str("checking"),
            AccountKind::Savings => f.write_str("savings"),
        }
    }
}

/// Persisted view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountRecord {
    #[serde(rename = "account")]
    pub id: AccountId,
    pub owner: OwnerId,
    pub kind: AccountKind,
    pub balance: Decimal,
}

impl AccountRecord {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        kind: AccountKind,
        balance: Decimal,
    ) -> Self {
        Self {
            id: AccountId(id.into()),
            owner: OwnerId(owner.into()),
            kind,
            balance,
        }
    }
}

impl Serialize for AccountRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("AccountRecord", 4)?;
        state.serialize_field("account", &self.id)?;
        state.serialize_field("owner", &self.owner)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(Account::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}

#[derive(Debug)]
pub(crate) struct AccountData {
    id: AccountId,
    owner: OwnerId,
    kind: AccountKind,
    balance: Decimal,
}

impl AccountData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub(crate) fn balance(&self) -> Decimal {
        self.balance
    }

    /// Decreases the balance.
    ///
    /// A non-positive amount is treated as an unfundable debit.
    pub(crate) fn debit(&mut self, amount: Decimal) -> Result<(), AtmError> {
        self.balance = self.debited(amount)?;
        self.assert_invariants();
        Ok(())
    }

    /// Balance after debiting `amount`, without applying it.
    pub(crate) fn debited(&self, amount: Decimal) -> Result<Decimal, AtmError> {
        if amount <= Decimal::ZERO || amount > self.balance {
            return Err(AtmError::InsufficientFunds);
        }
        Ok(self.balance - amount)
    }

    /// Increases the balance.
    ///
    /// An amount that would push the balance past [`Decimal::MAX`] is
    /// rejected and the balance is left as it was.
    pub(crate) fn credit(&mut self, amount: Decimal) -> Result<(), AtmError> {
        self.balance = self.credited(amount)?;
        self.assert_invariants();
        Ok(())
    }

    /// Balance after crediting `amount`, without applying it.
    pub(crate) fn credited(&self, amount: Decimal) -> Result<Decimal, AtmError> {
        if amount <= Decimal::ZERO {
            return Err(AtmError::InvalidAmount);
        }
        self.balance
            .checked_add(amount)
            .ok_or(AtmError::InvalidAmount)
    }

    pub(crate) fn record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id.clone(),
            owner: self.owner.clone(),
            kind: self.kind,
            balance: self.balance,
        }
    }
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    /// Balances carry currency minor units (cents).
    pub const DECIMAL_PRECISION: u32 = 2;

    /// Opens an account from a provisioning record.
    ///
    /// Negative opening balances are not representable and start at zero.
    pub fn open(record: AccountRecord) -> Self {
        let data = AccountData {
            id: record.id,
            owner: record.owner,
            kind: record.kind,
            balance: record.balance.max(Decimal::ZERO),
        };
        Self {
            inner: Mutex::new(data),
        }
    }

    pub fn id(&self) -> AccountId {
        self.inner.lock().id.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn record(&self) -> AccountRecord {
        self.inner.lock().record()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open(balance: Decimal) -> Account {
        Account::open(AccountRecord::new(
            "ACC001",
            "USR001",
            AccountKind::Checking,
            balance,
        ))
    }

    #[test]
    fn debit_reduces_balance() {
        let account = open(dec!(100.00));
        account.lock().debit(dec!(30.00)).unwrap();
        assert_eq!(account.balance(), dec!(70.00));
    }

    #[test]
    fn debit_of_entire_balance_leaves_zero() {
        let account = open(dec!(100.00));
        account.lock().debit(dec!(100.00)).unwrap();
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn debit_over_balance_is_insufficient_funds() {
        let account = open(dec!(50.00));
        let result = account.lock().debit(dec!(50.01));
        assert_eq!(result, Err(AtmError::InsufficientFunds));
        assert_eq!(account.balance(), dec!(50.00));
    }

    #[test]
    fn non_positive_debit_is_insufficient_funds() {
        let account = open(dec!(50.00));
        assert_eq!(
            account.lock().debit(Decimal::ZERO),
            Err(AtmError::InsufficientFunds)
        );
        assert_eq!(
            account.lock().debit(dec!(-5)),
            Err(AtmError::InsufficientFunds)
        );
    }

    #[test]
    fn non_positive_credit_is_invalid_amount() {
        let account = open(dec!(50.00));
        assert_eq!(
            account.lock().credit(Decimal::ZERO),
            Err(AtmError::InvalidAmount)
        );
        assert_eq!(account.balance(), dec!(50.00));
    }

    #[test]
    fn overflowing_credit_is_invalid_amount() {
        let account = open(dec!(1));
        assert_eq!(
            account.lock().credit(Decimal::MAX),
            Err(AtmError::InvalidAmount)
        );
        assert_eq!(account.balance(), dec!(1));
    }

    #[test]
    fn negative_opening_balance_starts_at_zero() {
        let account = open(dec!(-10));
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    // === Serialization Tests ===

    #[test]
    fn serializer_rounds_to_minor_units() {
        let record = AccountRecord::new("ACC001", "USR001", AccountKind::Savings, dec!(123.456));
        let json = serde_json::to_string(&record).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["account"], "ACC001");
        assert_eq!(parsed["owner"], "USR001");
        assert_eq!(parsed["kind"], "savings");
        assert_eq!(parsed["balance"].as_str().unwrap(), "123.46");
    }

    #[test]
    fn serializer_uses_bankers_rounding() {
        let record = AccountRecord::new("ACC001", "USR001", AccountKind::Checking, dec!(0.125));
        let json = serde_json::to_string(&record).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        // Round half to even: 0.125 -> 0.12
        assert_eq!(parsed["balance"].as_str().unwrap(), "0.12");
    }
}
