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

//! # Milhas Ledger
//!
//! This library tracks loyalty-program miles accounts ("milhas") with
//! weighted-average cost accounting: purchases, bonuses and sales, the cost
//! basis tied up in the balance, and realized profit or loss on each sale.
//!
//! ## Core Components
//!
//! - [`Account`]: Pure ledger for one (tenant, program, owner), with purchase, bonus and sale transitions
//! - [`SaleOutcome`]: New account state, removed cost and profit of a sale
//! - [`RoundingConfig`] / [`CostRounding`]: Decimal scale and rounding mode of the cost arithmetic
//! - [`MilesLot`]: A recorded acquisition lot, and the lot-based average cost report
//! - [`Engine`]: Orchestrates transitions over an [`AccountRepository`] and a [`TransactionLog`]
//! - [`LedgerError`]: Error types for ledger failures
//!
//! ## Example
//!
//! ```
//! use milhas_ledger::{Engine, ProgramId, PurchaseCommand, SaleCommand, Target, TenantId};
//! use rust_decimal_macros::dec;
//! use uuid::Uuid;
//!
//! let engine = Engine::new();
//! let target = Target {
//!     tenant_id: TenantId(Uuid::new_v4()),
//!     program_id: ProgramId(Uuid::new_v4()),
//!     program_name: "Smiles".to_string(),
//!     owner: "Joao Silva".to_string(),
//! };
//!
//! engine
//!     .register_purchase(PurchaseCommand {
//!         target: target.clone(),
//!         miles: 10_000,
//!         value: dec!(250.00),
//!         source: None,
//!         note: None,
//!     })
//!     .unwrap();
//!
//! let sale = engine
//!     .register_sale(SaleCommand { target, miles: 5_000, value: dec!(150.00), note: None })
//!     .unwrap();
//! assert_eq!(sale.account.balance(), 5_000);
//! assert_eq!(sale.profit, dec!(25.00));
//! ```
//!
//! ## Thread Safety
//!
//! [`Account`] transitions are pure functions over immutable values. The
//! [`Engine`] serializes read-modify-write per account and lets different
//! accounts proceed in parallel.

pub mod account;
mod base;
mod engine;
pub mod error;
pub mod lot;
mod program;
mod repository;
mod rounding;
mod transaction;
mod transaction_log;

pub use account::{Account, AccountRecord, SaleOutcome};
pub use base::{AccountId, AccountKey, ProgramId, TenantId, TransactionId};
pub use engine::{Engine, Receipt, SaleReceipt, TransactionReceipt};
pub use error::LedgerError;
pub use lot::{MilesLot, ProgramKind};
pub use program::{LoyaltyProgram, ProgramStatus};
pub use repository::{AccountRepository, InMemoryAccountRepository};
pub use rounding::{CostRounding, RoundingConfig, RoundingMode};
pub use transaction::{
    BonusCommand, Command, PurchaseCommand, SaleCommand, Target, Transaction, TransactionKind,
};
pub use transaction_log::TransactionLog;
