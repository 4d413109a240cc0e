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

//! Miles account with weighted-average cost tracking.
//!
//! Transitions
//!
//! ```text
//!  purchase: +miles, +cost basis,               average recomputed
//!  bonus:    +miles,  cost basis unchanged,     average diluted
//!  sale:     -miles, -proportional cost basis,  average unchanged (zero when emptied)
//! ```
//!
//! Every transition consumes nothing and returns a new [`Account`]; the caller
//! decides whether to persist it.
//!
//! # Example
//!
//! ```
//! use milhas_ledger::{Account, ProgramId, TenantId};
//! use rust_decimal_macros::dec;
//! use uuid::Uuid;
//!
//! let account = Account::open(TenantId(Uuid::new_v4()), ProgramId(Uuid::new_v4()), "Smiles", "Joao")
//!     .unwrap()
//!     .apply_purchase(10_000, dec!(250.00))
//!     .unwrap();
//! assert_eq!(account.average_cost(), dec!(25));
//!
//! let sale = account.apply_sale(5_000, dec!(150.00)).unwrap();
//! assert_eq!(sale.cost_removed, dec!(125));
//! assert_eq!(sale.profit, dec!(25));
//! ```

use crate::base::{AccountId, AccountKey, ProgramId, TenantId};
use crate::error::LedgerError;
use crate::rounding::CostRounding;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Miles per unit of average cost ("milheiro").
pub const MILES_PER_UNIT: Decimal = dec!(1000);

/// Ledger for one (tenant, program, owner).
///
/// # Invariants
///
/// - `balance == 0` implies `cost_basis == 0`.
/// - `balance`, `cost_basis` and `average_cost` are never negative.
/// - `average_cost` is always `cost_basis / (balance / 1000)`, zero when either is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    id: AccountId,
    tenant_id: TenantId,
    program_id: ProgramId,
    program_name: String,
    owner: String,
    balance: i64,
    cost_basis: Decimal,
    average_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Result of [`Account::apply_sale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleOutcome {
    /// Account state after the sale.
    pub account: Account,
    /// Cost basis attributed to the miles sold.
    pub cost_removed: Decimal,
    /// Sale value minus `cost_removed`; negative for a loss.
    pub profit: Decimal,
}

impl SaleOutcome {
    pub fn is_loss(&self) -> bool {
        self.profit < Decimal::ZERO
    }
}

impl Account {
    /// Opens an empty account.
    ///
    /// `program_name` and `owner` are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if either string is blank.
    pub fn open(
        tenant_id: TenantId,
        program_id: ProgramId,
        program_name: &str,
        owner: &str,
    ) -> Result<Self, LedgerError> {
        let program_name = program_name.trim();
        let owner = owner.trim();
        if program_name.is_empty() {
            return Err(LedgerError::invalid("programaNome nao pode estar vazio"));
        }
        if owner.is_empty() {
            return Err(LedgerError::invalid("owner nao pode estar vazio"));
        }

        let now = Utc::now();
        Ok(Self {
            id: AccountId::new(),
            tenant_id,
            program_id,
            program_name: program_name.to_string(),
            owner: owner.to_string(),
            balance: 0,
            cost_basis: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Miles currently held.
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Acquisition cost attributed to the current balance.
    pub fn cost_basis(&self) -> Decimal {
        self.cost_basis
    }

    /// Cost per thousand miles.
    pub fn average_cost(&self) -> Decimal {
        self.average_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.tenant_id, self.program_id, &self.owner)
    }

    /// Returns `true` if the account holds any miles.
    pub fn has_balance(&self) -> bool {
        self.balance > 0
    }

    /// Returns `true` if `miles` is positive and covered by the balance.
    pub fn can_withdraw(&self, miles: i64) -> bool {
        miles > 0 && miles <= self.balance
    }

    /// Records miles bought for `value`, with the default rounding.
    pub fn apply_purchase(&self, miles: i64, value: Decimal) -> Result<Self, LedgerError> {
        self.apply_purchase_with(miles, value, &CostRounding::DEFAULT)
    }

    /// Records miles bought for `value`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - `miles` is not positive or `value` is negative.
    /// - [`LedgerError::Overflow`] - the new balance or cost does not fit.
    pub fn apply_purchase_with(
        &self,
        miles: i64,
        value: Decimal,
        rounding: &CostRounding,
    ) -> Result<Self, LedgerError> {
        if miles <= 0 {
            return Err(LedgerError::invalid("milhas deve ser positivo para compra"));
        }
        if value < Decimal::ZERO {
            return Err(LedgerError::invalid("valor nao pode ser negativo"));
        }

        let balance = self.balance.checked_add(miles).ok_or(LedgerError::Overflow)?;
        let cost_basis = self
            .cost_basis
            .checked_add(value)
            .ok_or(LedgerError::Overflow)?;

        self.transition(balance, cost_basis, rounding)
    }

    /// Records free miles, with the default rounding.
    pub fn apply_bonus(&self, miles: i64) -> Result<Self, LedgerError> {
        self.apply_bonus_with(miles, &CostRounding::DEFAULT)
    }

    /// Records free miles (promotion, cashback). The cost basis does not move,
    /// so the average cost is diluted.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - `miles` is not positive.
    /// - [`LedgerError::Overflow`] - the new balance does not fit.
    pub fn apply_bonus_with(&self, miles: i64, rounding: &CostRounding) -> Result<Self, LedgerError> {
        if miles <= 0 {
            return Err(LedgerError::invalid("milhas deve ser positivo para bonus"));
        }

        let balance = self.balance.checked_add(miles).ok_or(LedgerError::Overflow)?;
        self.transition(balance, self.cost_basis, rounding)
    }

    /// Records miles sold for `value`, with the default rounding.
    pub fn apply_sale(&self, miles: i64, value: Decimal) -> Result<SaleOutcome, LedgerError> {
        self.apply_sale_with(miles, value, &CostRounding::DEFAULT)
    }

    /// Records miles sold for `value`.
    ///
    /// The cost basis is removed in proportion to the share of the balance
    /// sold. Selling the whole balance removes the whole cost basis.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - `miles` is not positive or `value` is negative.
    /// - [`LedgerError::InsufficientBalance`] - `miles` exceeds the balance.
    pub fn apply_sale_with(
        &self,
        miles: i64,
        value: Decimal,
        rounding: &CostRounding,
    ) -> Result<SaleOutcome, LedgerError> {
        if miles <= 0 {
            return Err(LedgerError::invalid("milhas deve ser positivo para venda"));
        }
        if value < Decimal::ZERO {
            return Err(LedgerError::invalid("valorVenda nao pode ser negativo"));
        }
        if miles > self.balance {
            return Err(LedgerError::InsufficientBalance {
                program_id: self.program_id,
                balance: self.balance,
                requested: miles,
            });
        }

        let balance = self.balance - miles;
        let (cost_removed, cost_basis) = if balance == 0 {
            (self.cost_basis, Decimal::ZERO)
        } else {
            let share = self
                .cost_basis
                .checked_mul(Decimal::from(miles))
                .and_then(|cost| cost.checked_div(Decimal::from(self.balance)))
                .ok_or(LedgerError::Overflow)?;
            let removed = rounding.monetary.round(share).min(self.cost_basis);
            (removed, self.cost_basis - removed)
        };
        let profit = rounding.monetary.round(value - cost_removed);

        Ok(SaleOutcome {
            account: self.transition(balance, cost_basis, rounding)?,
            cost_removed,
            profit,
        })
    }

    fn transition(
        &self,
        balance: i64,
        cost_basis: Decimal,
        rounding: &CostRounding,
    ) -> Result<Self, LedgerError> {
        let next = Self {
            balance,
            cost_basis,
            average_cost: average_cost(balance, cost_basis, rounding)?,
            updated_at: Utc::now().max(self.updated_at),
            program_name: self.program_name.clone(),
            owner: self.owner.clone(),
            ..*self
        };
        next.assert_invariants();
        Ok(next)
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= 0,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
        debug_assert!(
            self.cost_basis >= Decimal::ZERO,
            "Invariant violated: cost basis went negative: {}",
            self.cost_basis
        );
        debug_assert!(
            self.balance > 0 || self.cost_basis.is_zero(),
            "Invariant violated: empty account carries cost basis {}",
            self.cost_basis
        );
    }
}

/// `cost_basis / (balance / 1000)`, zero for an empty or free balance.
fn average_cost(
    balance: i64,
    cost_basis: Decimal,
    rounding: &CostRounding,
) -> Result<Decimal, LedgerError> {
    if balance == 0 || cost_basis.is_zero() {
        return Ok(Decimal::ZERO);
    }
    cost_basis
        .checked_mul(MILES_PER_UNIT)
        .and_then(|scaled| scaled.checked_div(Decimal::from(balance)))
        .map(|average| rounding.average_cost.round(average))
        .ok_or(LedgerError::Overflow)
}

/// Account as it is stored: every field may be absent.
///
/// Converting into an [`Account`] re-checks the ledger invariants, so a
/// corrupted row surfaces as [`LedgerError::InvariantViolation`] instead of
/// being coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: Option<AccountId>,
    pub tenant_id: Option<TenantId>,
    pub program_id: Option<ProgramId>,
    pub program_name: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub balance: i64,
    pub cost_basis: Option<Decimal>,
    pub average_cost: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = LedgerError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(LedgerError::NullArgument("id"))?;
        let tenant_id = record.tenant_id.ok_or(LedgerError::NullArgument("tenantId"))?;
        let program_id = record
            .program_id
            .ok_or(LedgerError::NullArgument("programaId"))?;
        let program_name = record
            .program_name
            .ok_or(LedgerError::NullArgument("programaNome"))?;
        let owner = record.owner.ok_or(LedgerError::NullArgument("owner"))?;
        let created_at = record
            .created_at
            .ok_or(LedgerError::NullArgument("criadoEm"))?;
        let updated_at = record
            .updated_at
            .ok_or(LedgerError::NullArgument("atualizadoEm"))?;
        let cost_basis = record.cost_basis.unwrap_or(Decimal::ZERO);
        let average_cost = record.average_cost.unwrap_or(Decimal::ZERO);

        if record.balance < 0 {
            return Err(LedgerError::InvariantViolation(
                "saldoMilhas nao pode ser negativo".to_string(),
            ));
        }
        if cost_basis < Decimal::ZERO {
            return Err(LedgerError::InvariantViolation(
                "custoBaseTotalBRL nao pode ser negativo".to_string(),
            ));
        }
        if average_cost < Decimal::ZERO {
            return Err(LedgerError::InvariantViolation(
                "custoMedioMilheiroAtual nao pode ser negativo".to_string(),
            ));
        }
        if record.balance == 0 && !cost_basis.is_zero() {
            return Err(LedgerError::InvariantViolation(
                "custoBaseTotalBRL deve ser zero quando saldoMilhas eh zero".to_string(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            program_id,
            program_name,
            owner,
            balance: record.balance,
            cost_basis,
            average_cost,
            created_at,
            updated_at,
        })
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        Self {
            id: Some(account.id),
            tenant_id: Some(account.tenant_id),
            program_id: Some(account.program_id),
            program_name: Some(account.program_name),
            owner: Some(account.owner),
            balance: account.balance,
            cost_basis: Some(account.cost_basis),
            average_cost: Some(account.average_cost),
            created_at: Some(account.created_at),
            updated_at: Some(account.updated_at),
        }
    }
}
