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

//! Account storage.
//!
//! Every lookup is scoped by tenant; an account is never visible to another
//! tenant even when its ID is known.

use crate::account::Account;
use crate::base::{AccountId, AccountKey, TenantId};
use dashmap::DashMap;

/// Key-by-tenant account store used by the [`Engine`](crate::Engine).
pub trait AccountRepository: Send + Sync {
    fn find_by_key(&self, key: &AccountKey) -> Option<Account>;

    fn find_by_id(&self, tenant_id: TenantId, id: AccountId) -> Option<Account>;

    /// Inserts or replaces the account stored under its key.
    fn save(&self, account: Account) -> Account;

    fn by_owner(&self, tenant_id: TenantId, owner: &str) -> Vec<Account>;

    fn all(&self, tenant_id: TenantId) -> Vec<Account>;
}

/// In-memory store backed by [`DashMap`].
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<AccountKey, Account>,
    /// Secondary index from account ID to its key.
    keys: DashMap<AccountId, AccountKey>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching<F>(&self, keep: F) -> Vec<Account>
    where
        F: Fn(&Account) -> bool,
    {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.key().cmp(&b.key()));
        accounts
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn find_by_key(&self, key: &AccountKey) -> Option<Account> {
        self.accounts.get(key).map(|entry| entry.value().clone())
    }

    fn find_by_id(&self, tenant_id: TenantId, id: AccountId) -> Option<Account> {
        let key = self.keys.get(&id).map(|entry| entry.value().clone())?;
        if key.tenant_id != tenant_id {
            return None;
        }
        self.find_by_key(&key)
    }

    fn save(&self, account: Account) -> Account {
        let key = account.key();
        self.keys.insert(account.id(), key.clone());
        self.accounts.insert(key, account.clone());
        account
    }

    fn by_owner(&self, tenant_id: TenantId, owner: &str) -> Vec<Account> {
        let owner = owner.trim();
        self.matching(|account| account.tenant_id() == tenant_id && account.owner() == owner)
    }

    fn all(&self, tenant_id: TenantId) -> Vec<Account> {
        self.matching(|account| account.tenant_id() == tenant_id)
    }
}
