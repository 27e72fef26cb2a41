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

//! Append-only audit trail with deduplication.
//!
//! Keeps completed transactions in insertion order and rejects a second
//! record with an ID already seen.

use crate::base::{AccountId, TransactionId};
use crate::error::StoreError;
use crate::store::TransactionStore;
use crate::transaction::Transaction;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory [`TransactionStore`].
///
/// Combines a [`DashMap`] for O(1) duplicate checking and lookup with an
/// ordered log. Records are shared as `Arc` between the two.
#[derive(Debug, Default)]
pub struct AuditTrail {
    /// Transactions by ID.
    transactions: DashMap<TransactionId, Arc<Transaction>>,

    /// Append order.
    log: RwLock<Vec<Arc<Transaction>>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transaction to the end of the trail.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTransaction`] if a transaction with the
    /// same ID was appended before.
    pub fn push(&self, transaction: Transaction) -> Result<(), StoreError> {
        let transaction_id = transaction.id().clone();

        // Entry API gives an atomic check-and-insert.
        match self.transactions.entry(transaction_id) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateTransaction(entry.key().clone())),
            Entry::Vacant(entry) => {
                let transaction = Arc::new(transaction);
                entry.insert(Arc::clone(&transaction));
                self.log.write().push(transaction);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &TransactionId) -> Option<Arc<Transaction>> {
        self.transactions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Every transaction touching `account`, oldest first.
    pub fn for_account(&self, account: &AccountId) -> Vec<Arc<Transaction>> {
        self.log
            .read()
            .iter()
            .filter(|tx| tx.involves(account))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }
}

impl TransactionStore for AuditTrail {
    fn append(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.push(transaction)
    }

    fn find_by_account(&self, id: &AccountId) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .for_account(id)
            .into_iter()
            .map(|tx| (*tx).clone())
            .collect())
    }

    fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.get(id).map(|tx| (*tx).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn keeps_append_order_per_account() {
        let trail = AuditTrail::new();
        let first = Transaction::deposit("A".into(), dec!(100));
        let other = Transaction::deposit("B".into(), dec!(5));
        let second = Transaction::transfer("A".into(), "B".into(), dec!(30));
        let first_id = first.id().clone();
        let second_id = second.id().clone();

        trail.push(first).unwrap();
        trail.push(other).unwrap();
        trail.push(second).unwrap();

        let history = trail.for_account(&"A".into());
        let ids: Vec<&TransactionId> = history.iter().map(|tx| tx.id()).collect();
        assert_eq!(ids, vec![&first_id, &second_id]);
        assert_eq!(trail.for_account(&"B".into()).len(), 2);
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let trail = AuditTrail::new();
        let tx = Transaction::withdrawal("A".into(), dec!(20));
        trail.push(tx.clone()).unwrap();

        assert_eq!(
            trail.push(tx.clone()),
            Err(StoreError::DuplicateTransaction(tx.id().clone()))
        );
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn lookup_by_id() {
        let trail = AuditTrail::new();
        let tx = Transaction::withdrawal("A".into(), dec!(20));
        let id = tx.id().clone();
        trail.append(tx).unwrap();

        assert_eq!(trail.find_by_id(&id).unwrap().unwrap().amount(), dec!(20));
        assert!(trail.get(&TransactionId("MISSING".into())).is_none());
    }
}
