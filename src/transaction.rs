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

//! Transaction records and the commands that produce them.
//!
//! A [`Transaction`] is written once per successful ledger transition and
//! never changes afterwards.

use crate::base::{AccountId, ProgramId, TenantId, TransactionId};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "COMPRA")]
    Purchase,
    #[serde(rename = "BONUS")]
    Bonus,
    #[serde(rename = "VENDA")]
    Sale,
}

/// Immutable log entry for one ledger transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub miles: i64,
    /// Amount paid (purchase) or received (sale); zero for bonuses.
    pub value: Decimal,
    pub source: Option<String>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    fn new(
        account_id: AccountId,
        kind: TransactionKind,
        miles: i64,
        value: Decimal,
        source: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            kind,
            miles,
            value,
            source,
            note,
            occurred_at: Utc::now(),
        }
    }

    pub fn purchase(
        account_id: AccountId,
        miles: i64,
        value: Decimal,
        source: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self::new(account_id, TransactionKind::Purchase, miles, value, source, note)
    }

    pub fn bonus(
        account_id: AccountId,
        miles: i64,
        source: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self::new(account_id, TransactionKind::Bonus, miles, Decimal::ZERO, source, note)
    }

    pub fn sale(account_id: AccountId, miles: i64, value: Decimal, note: Option<String>) -> Self {
        Self::new(account_id, TransactionKind::Sale, miles, value, None, note)
    }
}

/// Where a transition applies: tenant, program and owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub tenant_id: TenantId,
    pub program_id: ProgramId,
    /// Denormalized program name, used when the account must be opened.
    pub program_name: String,
    pub owner: String,
}

/// Miles bought for cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCommand {
    pub target: Target,
    pub miles: i64,
    pub value: Decimal,
    pub source: Option<String>,
    pub note: Option<String>,
}

/// Free miles (promotion, cashback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusCommand {
    pub target: Target,
    pub miles: i64,
    pub source: Option<String>,
    pub note: Option<String>,
}

/// Miles sold for cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCommand {
    pub target: Target,
    pub miles: i64,
    pub value: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Purchase(PurchaseCommand),
    Bonus(BonusCommand),
    Sale(SaleCommand),
}

impl Command {
    /// Builds a command from loosely typed input, where the value may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NullArgument`] when a purchase or sale has no value.
    pub fn from_parts(
        kind: TransactionKind,
        target: Target,
        miles: i64,
        value: Option<Decimal>,
        source: Option<String>,
        note: Option<String>,
    ) -> Result<Self, LedgerError> {
        Ok(match kind {
            TransactionKind::Purchase => Self::Purchase(PurchaseCommand {
                target,
                miles,
                value: value.ok_or(LedgerError::NullArgument("valor"))?,
                source,
                note,
            }),
            TransactionKind::Bonus => Self::Bonus(BonusCommand {
                target,
                miles,
                source,
                note,
            }),
            TransactionKind::Sale => Self::Sale(SaleCommand {
                target,
                miles,
                value: value.ok_or(LedgerError::NullArgument("valorVenda"))?,
                note,
            }),
        })
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase(_) => TransactionKind::Purchase,
            Self::Bonus(_) => TransactionKind::Bonus,
            Self::Sale(_) => TransactionKind::Sale,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            Self::Purchase(command) => &command.target,
            Self::Bonus(command) => &command.target,
            Self::Sale(command) => &command.target,
        }
    }
}
