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

//! Loyalty program catalog entries.

use crate::base::ProgramId;
use crate::error::LedgerError;
use crate::rounding::{CostRounding, RoundingConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramStatus {
    Active,
    Inactive,
}

/// A loyalty program and the rounding rules its accounts use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    id: ProgramId,
    brand: String,
    status: ProgramStatus,
    currency: String,
    rounding: RoundingConfig,
}

impl LoyaltyProgram {
    pub const DEFAULT_CURRENCY: &'static str = "BRL";

    /// Active program in BRL with the default rounding.
    pub fn new(id: ProgramId, brand: &str) -> Result<Self, LedgerError> {
        Self::with_currency(id, brand, Self::DEFAULT_CURRENCY)
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if `brand` is blank or
    /// `currency` is not a 3-letter ISO code.
    pub fn with_currency(id: ProgramId, brand: &str, currency: &str) -> Result<Self, LedgerError> {
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(LedgerError::invalid("brand nao pode estar vazio"));
        }
        if currency.chars().count() != 3 {
            return Err(LedgerError::invalid(
                "moeda deve ter exatamente 3 caracteres (codigo ISO)",
            ));
        }
        Ok(Self {
            id,
            brand: brand.to_string(),
            status: ProgramStatus::Active,
            currency: currency.to_uppercase(),
            rounding: RoundingConfig::DEFAULT,
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn rounding(&self) -> RoundingConfig {
        self.rounding
    }

    pub fn is_active(&self) -> bool {
        self.status == ProgramStatus::Active
    }

    pub fn activate(&self) -> Self {
        Self {
            status: ProgramStatus::Active,
            ..self.clone()
        }
    }

    pub fn deactivate(&self) -> Self {
        Self {
            status: ProgramStatus::Inactive,
            ..self.clone()
        }
    }

    pub fn with_rounding(&self, rounding: RoundingConfig) -> Self {
        Self {
            rounding,
            ..self.clone()
        }
    }

    /// Rounding applied to this program's ledger arithmetic.
    pub fn cost_rounding(&self) -> CostRounding {
        CostRounding::with_monetary(self.rounding)
    }
}
