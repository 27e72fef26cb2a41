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

//! Completed transaction records.
//!
//! A [`Transaction`] is created once a workflow has committed and is never
//! mutated afterwards. Accounts are referenced by ID only:
//!
//! | Kind | from | to |
//! |------|------|----|
//! | Withdrawal | account | - |
//! | Deposit | - | account |
//! | Transfer | source | destination |

use crate::base::{AccountId, TransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Withdrawal,
    Deposit,
    Transfer,
    BalanceInquiry,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::BalanceInquiry => "BALANCE_INQUIRY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    amount: Decimal,
    from: Option<AccountId>,
    to: Option<AccountId>,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        amount: Decimal,
        from: Option<AccountId>,
        to: Option<AccountId>,
    ) -> Self {
        debug_assert!(amount > Decimal::ZERO, "transaction amount must be positive");
        Self {
            id: TransactionId::generate(),
            kind,
            amount,
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn withdrawal(account: AccountId, amount: Decimal) -> Self {
        Self::new(TransactionKind::Withdrawal, amount, Some(account), None)
    }

    pub(crate) fn deposit(account: AccountId, amount: Decimal) -> Self {
        Self::new(TransactionKind::Deposit, amount, None, Some(account))
    }

    pub(crate) fn transfer(from: AccountId, to: AccountId, amount: Decimal) -> Self {
        Self::new(TransactionKind::Transfer, amount, Some(from), Some(to))
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn from(&self) -> Option<&AccountId> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&AccountId> {
        self.to.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True if `account` is the source or the destination.
    pub fn involves(&self, account: &AccountId) -> bool {
        self.from.as_ref() == Some(account) || self.to.as_ref() == Some(account)
    }
}
