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

//! Acquisition lots and the lot-based average cost report.
//!
//! Unlike [`Account`](crate::Account), which keeps a running moving average,
//! this report averages a raw list of recorded lots.

use crate::account::MILES_PER_UNIT;
use crate::error::LedgerError;
use crate::rounding::RoundingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scale of prices per thousand miles in lot reports.
const PRICE: RoundingConfig = RoundingConfig::DEFAULT;

/// Loyalty program a lot was recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramKind {
    LatamPass,
    Smiles,
    AzulFidelidade,
    Livelo,
    Esfera,
    Other,
}

/// Miles acquired in one go, for a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilesLot {
    id: Option<Uuid>,
    program: ProgramKind,
    quantity: i64,
    value: Decimal,
}

impl MilesLot {
    /// Creates an unsaved lot (no ID).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if `quantity` is not positive or
    /// `value` is negative.
    pub fn new(program: ProgramKind, quantity: i64, value: Decimal) -> Result<Self, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::invalid("quantidade deve ser positiva"));
        }
        if value < Decimal::ZERO {
            return Err(LedgerError::invalid("valor nao pode ser negativo"));
        }
        Ok(Self {
            id: None,
            program,
            quantity,
            value,
        })
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn program(&self) -> ProgramKind {
        self.program
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// `value / (quantity / 1000)`, 4 places half-up.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the value is too large to scale.
    pub fn price_per_thousand(&self) -> Result<Decimal, LedgerError> {
        per_thousand(self.value, self.quantity)
    }

    pub fn with_id(&self, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    pub fn with_quantity(&self, quantity: i64) -> Result<Self, LedgerError> {
        Self::new(self.program, quantity, self.value).map(|lot| Self { id: self.id, ..lot })
    }

    pub fn with_value(&self, value: Decimal) -> Result<Self, LedgerError> {
        Self::new(self.program, self.quantity, value).map(|lot| Self { id: self.id, ..lot })
    }
}

/// Sum of the quantities of `lots`.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if the sum does not fit in an `i64`.
pub fn total_quantity(lots: &[MilesLot]) -> Result<i64, LedgerError> {
    lots.iter().try_fold(0i64, |total, lot| {
        total.checked_add(lot.quantity).ok_or(LedgerError::Overflow)
    })
}

/// Average price per thousand miles across `lots`, 4 places half-up.
///
/// Returns zero for an empty list.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if the total quantity or value does not fit.
pub fn average_cost_per_thousand(lots: &[MilesLot]) -> Result<Decimal, LedgerError> {
    let quantity = total_quantity(lots)?;
    if quantity == 0 {
        return Ok(Decimal::ZERO);
    }
    let value = lots.iter().try_fold(Decimal::ZERO, |total, lot| {
        total.checked_add(lot.value).ok_or(LedgerError::Overflow)
    })?;
    per_thousand(value, quantity)
}

fn per_thousand(value: Decimal, quantity: i64) -> Result<Decimal, LedgerError> {
    value
        .checked_mul(MILES_PER_UNIT)
        .and_then(|scaled| scaled.checked_div(Decimal::from(quantity)))
        .map(|price| PRICE.round(price))
        .ok_or(LedgerError::Overflow)
}
