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

//! Thread-safe, append-only transaction log with deduplication.
//!
//! Records are kept per account in append order; nothing is ever updated or
//! removed.

use crate::base::{AccountId, TransactionId};
use crate::error::LedgerError;
use crate::transaction::{Transaction, TransactionKind};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Append-only transaction log.
///
/// Combines a [`DashMap`] keyed by transaction ID for O(1) duplicate
/// detection with a per-account index that preserves append order.
#[derive(Debug, Default)]
pub struct TransactionLog {
    transactions: DashMap<TransactionId, Arc<Transaction>>,
    by_account: DashMap<AccountId, Vec<Arc<Transaction>>>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTransaction`] if a record with the
    /// same ID was already appended.
    pub fn append(&self, transaction: Transaction) -> Result<Arc<Transaction>, LedgerError> {
        // Entry API keeps check-and-insert atomic.
        match self.transactions.entry(transaction.id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateTransaction),
            Entry::Vacant(entry) => {
                let transaction = Arc::new(transaction);
                entry.insert(Arc::clone(&transaction));
                self.by_account
                    .entry(transaction.account_id)
                    .or_default()
                    .push(Arc::clone(&transaction));
                Ok(transaction)
            }
        }
    }

    pub fn get(&self, id: &TransactionId) -> Option<Arc<Transaction>> {
        self.transactions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All records of an account, oldest first.
    pub fn for_account(&self, account_id: &AccountId) -> Vec<Arc<Transaction>> {
        self.filtered(account_id, |_| true)
    }

    /// Records of an account that occurred within `[start, end]`.
    pub fn between(
        &self,
        account_id: &AccountId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Arc<Transaction>> {
        self.filtered(account_id, |tx| tx.occurred_at >= start && tx.occurred_at <= end)
    }

    /// Records of an account with the given kind.
    pub fn of_kind(&self, account_id: &AccountId, kind: TransactionKind) -> Vec<Arc<Transaction>> {
        self.filtered(account_id, |tx| tx.kind == kind)
    }

    fn filtered<F>(&self, account_id: &AccountId, keep: F) -> Vec<Arc<Transaction>>
    where
        F: Fn(&Transaction) -> bool,
    {
        self.by_account
            .get(account_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|tx| keep(tx))
                    .map(Arc::clone)
                    .collect()
            })
            .unwrap_or_default()
    }
}
