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

//! Rounding rules for monetary and average-cost figures.
//!
//! # Example
//!
//! ```
//! use milhas_ledger::{RoundingConfig, RoundingMode};
//! use rust_decimal_macros::dec;
//!
//! let config = RoundingConfig::new(2, RoundingMode::HalfUp).unwrap();
//! assert_eq!(config.round(dec!(10.125)), dec!(10.13));
//! ```

use crate::error::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a value is rounded when it has more decimal places than allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Towards zero.
    Down,
    /// Towards positive infinity.
    Ceiling,
    /// Towards negative infinity.
    Floor,
    /// Nearest neighbour, ties away from zero.
    HalfUp,
    /// Nearest neighbour, ties towards zero.
    HalfDown,
    /// Nearest neighbour, ties to the even neighbour (banker's rounding).
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Up => RoundingStrategy::AwayFromZero,
            Self::Down => RoundingStrategy::ToZero,
            Self::Ceiling => RoundingStrategy::ToPositiveInfinity,
            Self::Floor => RoundingStrategy::ToNegativeInfinity,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Number of decimal places plus rounding mode.
///
/// Immutable; validated on construction so an out-of-range scale can never
/// reach the ledger arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundingConfig {
    decimal_places: u32,
    mode: RoundingMode,
}

impl RoundingConfig {
    pub const MAX_DECIMAL_PLACES: u32 = 6;

    /// 4 decimal places, half-up.
    pub const DEFAULT: RoundingConfig = RoundingConfig {
        decimal_places: 4,
        mode: RoundingMode::HalfUp,
    };

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] if `decimal_places` is above 6.
    pub fn new(decimal_places: u32, mode: RoundingMode) -> Result<Self, LedgerError> {
        if decimal_places > Self::MAX_DECIMAL_PLACES {
            return Err(LedgerError::invalid("casasDecimais deve estar entre 0 e 6"));
        }
        Ok(Self {
            decimal_places,
            mode,
        })
    }

    /// `decimal_places` places with half-up rounding.
    pub fn with_decimal_places(decimal_places: u32) -> Result<Self, LedgerError> {
        Self::new(decimal_places, RoundingMode::HalfUp)
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn mode(&self) -> RoundingMode {
        self.mode
    }

    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places, self.mode.strategy())
    }
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The two scales used by the cost-basis arithmetic.
///
/// `monetary` applies to cost basis, removed cost and profit; `average_cost`
/// applies to the cost per thousand miles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRounding {
    pub monetary: RoundingConfig,
    pub average_cost: RoundingConfig,
}

impl CostRounding {
    /// 6 decimal places, half-up.
    pub const DEFAULT_AVERAGE_COST: RoundingConfig = RoundingConfig {
        decimal_places: 6,
        mode: RoundingMode::HalfUp,
    };

    pub const DEFAULT: CostRounding = CostRounding {
        monetary: RoundingConfig::DEFAULT,
        average_cost: Self::DEFAULT_AVERAGE_COST,
    };

    /// Uses `monetary` for amounts and the default average-cost scale.
    pub fn with_monetary(monetary: RoundingConfig) -> Self {
        Self {
            monetary,
            average_cost: Self::DEFAULT_AVERAGE_COST,
        }
    }
}

impl Default for CostRounding {
    fn default() -> Self {
        Self::DEFAULT
    }
}
