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

//! Error types for ledger, reserve and maintenance operations.
//!
//! Every error is recoverable by the caller: a menu or batch driver reports
//! it and moves on to the next request.

use crate::base::{AccountId, TransactionId};
use thiserror::Error;

/// Which physical resource the machine is short of.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortage {
    /// Total cash in the machine is below the requested amount
    #[error("machine out of cash")]
    InsufficientCash,

    /// Enough cash overall, but the note mix cannot form the exact amount
    #[error("cannot dispense exact amount with available denominations")]
    NoExactSplit,

    #[error("out of ink")]
    OutOfInk,

    #[error("out of paper")]
    OutOfPaper,
}

/// ATM engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtmError {
    /// Referenced account does not exist
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Referenced transaction does not exist
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Debit would exceed the account balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The machine cannot meet a cash, ink or paper requirement
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(Shortage),

    /// Amount is zero, negative, too precise, or otherwise unusable
    #[error("invalid amount")]
    InvalidAmount,

    /// Caller's role or the running software does not permit the action
    #[error("operation not permitted: {0}")]
    Unauthorized(String),

    /// Software update does not move the version forward
    #[error("software version {requested} is not newer than {current}")]
    InvalidVersion { current: String, requested: String },

    /// A persistence collaborator failed while reading
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<Shortage> for AtmError {
    fn from(shortage: Shortage) -> Self {
        AtmError::ResourceUnavailable(shortage)
    }
}

/// Failure reported by a persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("duplicate transaction ID: {0}")]
    DuplicateTransaction(TransactionId),
}
