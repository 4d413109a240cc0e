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

//! Transaction orchestration engine.
//!
//! The [`Engine`] loads (or opens) an account, applies one ledger transition,
//! stores the new state and appends a record to the [`TransactionLog`].
//!
//! # Transitions
//!
//! - **Purchases**: open the account if needed, add miles and cost.
//! - **Bonuses**: open the account if needed, add free miles.
//! - **Sales**: require an existing account, remove miles and proportional cost.
//!
//! # Thread Safety
//!
//! Read-modify-write cycles are serialized per account with a mutex keyed by
//! [`AccountKey`]. Transitions on different accounts run in parallel.

use crate::account::Account;
use crate::base::{AccountId, AccountKey, ProgramId, TenantId};
use crate::error::LedgerError;
use crate::program::LoyaltyProgram;
use crate::repository::{AccountRepository, InMemoryAccountRepository};
use crate::rounding::CostRounding;
use crate::transaction::{
    BonusCommand, Command, PurchaseCommand, SaleCommand, Target, Transaction, TransactionKind,
};
use crate::transaction_log::TransactionLog;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a purchase or bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction: Arc<Transaction>,
    pub account: Account,
}

/// Outcome of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReceipt {
    pub transaction: Arc<Transaction>,
    pub account: Account,
    pub cost_removed: Decimal,
    pub profit: Decimal,
}

/// Result of [`Engine::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Transaction(TransactionReceipt),
    Sale(SaleReceipt),
}

impl Receipt {
    pub fn account(&self) -> &Account {
        match self {
            Self::Transaction(receipt) => &receipt.account,
            Self::Sale(receipt) => &receipt.account,
        }
    }
}

/// Orchestrates ledger transitions over an account store and a transaction log.
///
/// # Invariants
///
/// - At most one transition is in flight per (tenant, program, owner).
/// - A transaction record is appended only after the new account state is saved.
/// - Failed transitions leave the store and the log untouched.
pub struct Engine<R = InMemoryAccountRepository> {
    accounts: R,
    transactions: TransactionLog,
    programs: DashMap<ProgramId, LoyaltyProgram>,
    locks: DashMap<AccountKey, Arc<Mutex<()>>>,
    rounding: CostRounding,
}

impl Engine {
    /// Creates an engine with an in-memory store and the default rounding.
    pub fn new() -> Self {
        Self::with_repository(InMemoryAccountRepository::new())
    }

    /// Creates an in-memory engine whose unregistered programs use `rounding`.
    pub fn with_rounding(rounding: CostRounding) -> Self {
        Self {
            rounding,
            ..Self::new()
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AccountRepository> Engine<R> {
    pub fn with_repository(accounts: R) -> Self {
        Engine {
            accounts,
            transactions: TransactionLog::new(),
            programs: DashMap::new(),
            locks: DashMap::new(),
            rounding: CostRounding::DEFAULT,
        }
    }

    /// Adds or replaces a catalog entry; its rounding applies to later transitions.
    pub fn register_program(&self, program: LoyaltyProgram) {
        self.programs.insert(program.id(), program);
    }

    pub fn program(&self, id: &ProgramId) -> Option<LoyaltyProgram> {
        self.programs.get(id).map(|entry| entry.value().clone())
    }

    /// Dispatches a command to the matching `register_*` method.
    pub fn process(&self, command: Command) -> Result<Receipt, LedgerError> {
        match command {
            Command::Purchase(command) => self.register_purchase(command).map(Receipt::Transaction),
            Command::Bonus(command) => self.register_bonus(command).map(Receipt::Transaction),
            Command::Sale(command) => self.register_sale(command).map(Receipt::Sale),
        }
    }

    /// Records a purchase, opening the account on first use.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - non-positive miles, negative value, blank names.
    /// - [`LedgerError::Overflow`] - the balance or cost basis no longer fits.
    pub fn register_purchase(
        &self,
        command: PurchaseCommand,
    ) -> Result<TransactionReceipt, LedgerError> {
        info!(
            program = %command.target.program_name,
            owner = %command.target.owner,
            miles = command.miles,
            value = %command.value,
            "registering purchase"
        );

        let rounding = self.rounding_for(&command.target.program_id);
        let (transaction, account) = self.serialized(&command.target, || {
            let account = self
                .find_or_open(&command.target)?
                .apply_purchase_with(command.miles, command.value, &rounding)?;
            let account = self.accounts.save(account);
            let transaction = self.transactions.append(Transaction::purchase(
                account.id(),
                command.miles,
                command.value,
                command.source,
                command.note,
            ))?;
            Ok((transaction, account))
        })?;

        info!(
            transaction = %transaction.id,
            account = %account.id(),
            balance = account.balance(),
            "purchase registered"
        );
        Ok(TransactionReceipt {
            transaction,
            account,
        })
    }

    /// Records free miles, opening the account on first use.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - non-positive miles, blank names.
    /// - [`LedgerError::Overflow`] - the balance no longer fits.
    pub fn register_bonus(&self, command: BonusCommand) -> Result<TransactionReceipt, LedgerError> {
        info!(
            program = %command.target.program_name,
            owner = %command.target.owner,
            miles = command.miles,
            source = command.source.as_deref().unwrap_or_default(),
            "registering bonus"
        );

        let rounding = self.rounding_for(&command.target.program_id);
        let (transaction, account) = self.serialized(&command.target, || {
            let account = self
                .find_or_open(&command.target)?
                .apply_bonus_with(command.miles, &rounding)?;
            let account = self.accounts.save(account);
            let transaction = self.transactions.append(Transaction::bonus(
                account.id(),
                command.miles,
                command.source,
                command.note,
            ))?;
            Ok((transaction, account))
        })?;

        info!(
            transaction = %transaction.id,
            account = %account.id(),
            balance = account.balance(),
            "bonus registered"
        );
        Ok(TransactionReceipt {
            transaction,
            account,
        })
    }

    /// Records a sale against an existing account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AccountNotFound`] - no account for the target.
    /// - [`LedgerError::InsufficientBalance`] - more miles than held.
    /// - [`LedgerError::InvalidArgument`] - non-positive miles, negative value.
    pub fn register_sale(&self, command: SaleCommand) -> Result<SaleReceipt, LedgerError> {
        info!(
            program = %command.target.program_name,
            owner = %command.target.owner,
            miles = command.miles,
            value = %command.value,
            "registering sale"
        );

        let rounding = self.rounding_for(&command.target.program_id);
        let key = target_key(&command.target);
        let (transaction, account, outcome) = self.serialized(&command.target, || {
            let account =
                self.accounts
                    .find_by_key(&key)
                    .ok_or_else(|| LedgerError::AccountNotFound {
                        program_id: key.program_id,
                        owner: key.owner.clone(),
                    })?;
            let outcome = account.apply_sale_with(command.miles, command.value, &rounding)?;
            let account = self.accounts.save(outcome.account.clone());
            let transaction = self.transactions.append(Transaction::sale(
                account.id(),
                command.miles,
                command.value,
                command.note,
            ))?;
            Ok((transaction, account, outcome))
        })?;

        info!(
            transaction = %transaction.id,
            account = %account.id(),
            balance = account.balance(),
            profit = %outcome.profit,
            "sale registered"
        );
        Ok(SaleReceipt {
            transaction,
            account,
            cost_removed: outcome.cost_removed,
            profit: outcome.profit,
        })
    }

    pub fn account(&self, tenant_id: TenantId, id: AccountId) -> Option<Account> {
        self.accounts.find_by_id(tenant_id, id)
    }

    pub fn account_for(&self, key: &AccountKey) -> Option<Account> {
        self.accounts.find_by_key(key)
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if `owner` is blank.
    pub fn accounts_by_owner(
        &self,
        tenant_id: TenantId,
        owner: &str,
    ) -> Result<Vec<Account>, LedgerError> {
        if owner.trim().is_empty() {
            return Err(LedgerError::invalid("owner nao pode estar vazio"));
        }
        Ok(self.accounts.by_owner(tenant_id, owner))
    }

    /// All accounts of a tenant, ordered by key.
    pub fn accounts(&self, tenant_id: TenantId) -> Vec<Account> {
        self.accounts.all(tenant_id)
    }

    /// Miles held across all accounts of a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the sum does not fit in an `i64`.
    pub fn total_miles(&self, tenant_id: TenantId) -> Result<i64, LedgerError> {
        self.accounts(tenant_id)
            .iter()
            .try_fold(0i64, |total, account| {
                total.checked_add(account.balance()).ok_or(LedgerError::Overflow)
            })
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if an owner's total does not fit in an `i64`.
    pub fn totals_by_owner(
        &self,
        tenant_id: TenantId,
    ) -> Result<BTreeMap<String, i64>, LedgerError> {
        self.totals(tenant_id, |account| account.owner().to_string())
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if a program's total does not fit in an `i64`.
    pub fn totals_by_program(
        &self,
        tenant_id: TenantId,
    ) -> Result<BTreeMap<String, i64>, LedgerError> {
        self.totals(tenant_id, |account| account.program_name().to_string())
    }

    pub fn transactions_for(&self, account_id: &AccountId) -> Vec<Arc<Transaction>> {
        self.transactions.for_account(account_id)
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if `start` is after `end`.
    pub fn transactions_between(
        &self,
        account_id: &AccountId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Arc<Transaction>>, LedgerError> {
        if start > end {
            return Err(LedgerError::invalid("inicio nao pode ser posterior a fim"));
        }
        Ok(self.transactions.between(account_id, start, end))
    }

    pub fn transactions_of_kind(
        &self,
        account_id: &AccountId,
        kind: TransactionKind,
    ) -> Vec<Arc<Transaction>> {
        self.transactions.of_kind(account_id, kind)
    }

    pub fn transaction_log(&self) -> &TransactionLog {
        &self.transactions
    }

    fn totals<F>(
        &self,
        tenant_id: TenantId,
        group: F,
    ) -> Result<BTreeMap<String, i64>, LedgerError>
    where
        F: Fn(&Account) -> String,
    {
        let mut totals = BTreeMap::new();
        for account in self.accounts(tenant_id) {
            let total = totals.entry(group(&account)).or_insert(0i64);
            *total = total
                .checked_add(account.balance())
                .ok_or(LedgerError::Overflow)?;
        }
        Ok(totals)
    }

    fn rounding_for(&self, program_id: &ProgramId) -> CostRounding {
        self.programs
            .get(program_id)
            .map(|program| program.cost_rounding())
            .unwrap_or(self.rounding)
    }

    /// Runs `apply` while holding the target account's mutex.
    ///
    /// A failed transition drops the mutex entry when no other caller holds
    /// it, so rejected targets do not accumulate in the lock map.
    fn serialized<T, F>(&self, target: &Target, apply: F) -> Result<T, LedgerError>
    where
        F: FnOnce() -> Result<T, LedgerError>,
    {
        let key = target_key(target);
        let lock = self.lock_for(&key);
        let result = {
            let _guard = lock.lock();
            apply()
        };
        if result.is_err() {
            // Held by the map and by us only.
            self.locks
                .remove_if(&key, |_, entry| Arc::strong_count(entry) == 2);
        }
        result
    }

    /// Per-account mutex; cloned out so no map shard stays locked while it is held.
    fn lock_for(&self, key: &AccountKey) -> Arc<Mutex<()>> {
        let lock = self.locks.entry(key.clone()).or_default();
        Arc::clone(lock.value())
    }

    fn find_or_open(&self, target: &Target) -> Result<Account, LedgerError> {
        if let Some(account) = self.accounts.find_by_key(&target_key(target)) {
            debug!(account = %account.id(), "existing account found");
            return Ok(account);
        }

        info!(program = %target.program_name, owner = %target.owner, "opening account");
        Account::open(
            target.tenant_id,
            target.program_id,
            &target.program_name,
            &target.owner,
        )
    }
}

fn target_key(target: &Target) -> AccountKey {
    AccountKey::new(target.tenant_id, target.program_id, &target.owner)
}
