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

//! Error types for ledger operations.

use crate::base::ProgramId;
use thiserror::Error;

/// Ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required value was absent (missing column, missing stored field)
    #[error("{0} eh obrigatorio")]
    NullArgument(&'static str),

    /// A value violated a domain precondition
    #[error("{0}")]
    InvalidArgument(String),

    /// A sale asked for more miles than the account holds
    #[error(
        "Saldo de milhas insuficiente no programa {program_id}: saldo atual = {balance}, solicitado = {requested}"
    )]
    InsufficientBalance {
        program_id: ProgramId,
        balance: i64,
        requested: i64,
    },

    /// Stored account state breaks a ledger invariant
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Sale against an account that was never opened
    #[error("conta nao encontrada para programa {program_id} e owner {owner}")]
    AccountNotFound { program_id: ProgramId, owner: String },

    /// Duplicate transaction ID
    #[error("duplicate transaction ID")]
    DuplicateTransaction,

    /// Balance or amount exceeded the representable range
    #[error("arithmetic overflow")]
    Overflow,
}

impl LedgerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Number of miles missing for an [`InsufficientBalance`](Self::InsufficientBalance) failure.
    pub fn deficit(&self) -> Option<i64> {
        match self {
            Self::InsufficientBalance {
                balance, requested, ..
            } => Some(requested - balance),
            _ => None,
        }
    }
}
