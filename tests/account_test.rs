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

//! Account public API integration tests.

use chrono::{TimeZone, Utc};
use milhas_ledger::{
    Account, AccountId, AccountRecord, LedgerError, ProgramId, TenantId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

// === Helper Functions ===

fn tenant_id() -> TenantId {
    TenantId(Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap())
}

fn program_id() -> ProgramId {
    ProgramId(Uuid::parse_str("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa").unwrap())
}

fn record(balance: i64, cost_basis: Decimal, average_cost: Decimal) -> AccountRecord {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    AccountRecord {
        id: Some(AccountId(
            Uuid::parse_str("cccccccc-cccc-cccc-cccc-cccccccccccc").unwrap(),
        )),
        tenant_id: Some(tenant_id()),
        program_id: Some(program_id()),
        program_name: Some("Smiles".to_string()),
        owner: Some("Joao Silva".to_string()),
        balance,
        cost_basis: Some(cost_basis),
        average_cost: Some(average_cost),
        created_at: Some(now),
        updated_at: Some(now),
    }
}

fn account_with(balance: i64, cost_basis: Decimal, average_cost: Decimal) -> Account {
    Account::try_from(record(balance, cost_basis, average_cost)).unwrap()
}

fn empty_account() -> Account {
    account_with(0, Decimal::ZERO, Decimal::ZERO)
}

fn invalid(message: &str) -> LedgerError {
    LedgerError::InvalidArgument(message.to_string())
}

// === Opening ===

#[test]
fn open_creates_empty_account() {
    let account = Account::open(tenant_id(), program_id(), "Smiles", "Joao Silva").unwrap();

    assert_eq!(account.tenant_id(), tenant_id());
    assert_eq!(account.program_id(), program_id());
    assert_eq!(account.program_name(), "Smiles");
    assert_eq!(account.owner(), "Joao Silva");
    assert_eq!(account.balance(), 0);
    assert_eq!(account.cost_basis(), Decimal::ZERO);
    assert_eq!(account.average_cost(), Decimal::ZERO);
    assert_eq!(account.created_at(), account.updated_at());
    assert!(!account.has_balance());
}

#[test]
fn open_trims_names() {
    let account =
        Account::open(tenant_id(), program_id(), "  Azul Fidelidade  ", "  Pedro Costa  ").unwrap();
    assert_eq!(account.program_name(), "Azul Fidelidade");
    assert_eq!(account.owner(), "Pedro Costa");
}

#[test]
fn open_assigns_fresh_ids() {
    let first = Account::open(tenant_id(), program_id(), "Smiles", "Joao").unwrap();
    let second = Account::open(tenant_id(), program_id(), "Smiles", "Joao").unwrap();
    assert_ne!(first.id(), second.id());
}

#[test]
fn open_rejects_blank_program_name() {
    assert_eq!(
        Account::open(tenant_id(), program_id(), "   ", "Joao Silva"),
        Err(invalid("programaNome nao pode estar vazio"))
    );
}

#[test]
fn open_rejects_blank_owner() {
    assert_eq!(
        Account::open(tenant_id(), program_id(), "Smiles", "   "),
        Err(invalid("owner nao pode estar vazio"))
    );
}

// === Purchases ===

#[test]
fn first_purchase_sets_average_cost() {
    let account = Account::open(tenant_id(), program_id(), "Smiles", "Joao")
        .unwrap()
        .apply_purchase(10_000, dec!(250.00))
        .unwrap();

    assert_eq!(account.balance(), 10_000);
    assert_eq!(account.cost_basis(), dec!(250.0000));
    assert_eq!(account.average_cost(), dec!(25.000000));
}

#[test]
fn purchase_into_existing_balance_moves_average() {
    let account = account_with(10_000, dec!(250.00), dec!(25.00));
    let updated = account.apply_purchase(5_000, dec!(100.00)).unwrap();

    assert_eq!(updated.balance(), 15_000);
    assert_eq!(updated.cost_basis(), dec!(350.0000));
    assert_eq!(updated.average_cost(), dec!(23.333333));
    assert_eq!(updated.id(), account.id());
    assert_eq!(updated.tenant_id(), account.tenant_id());
    assert_eq!(updated.program_id(), account.program_id());
    assert!(updated.updated_at() >= account.updated_at());
}

#[test]
fn large_purchase() {
    let account = empty_account().apply_purchase(100_000, dec!(2500.00)).unwrap();
    assert_eq!(account.balance(), 100_000);
    assert_eq!(account.cost_basis(), dec!(2500.0000));
    assert_eq!(account.average_cost(), dec!(25.000000));
}

#[test]
fn zero_value_purchase_dilutes_average() {
    let account = account_with(5_000, dec!(100.00), dec!(20.00));
    let updated = account.apply_purchase(1_000, Decimal::ZERO).unwrap();

    assert_eq!(updated.balance(), 6_000);
    assert_eq!(updated.cost_basis(), dec!(100.0000));
    assert_eq!(updated.average_cost(), dec!(16.666667));
}

#[test]
fn purchase_rejects_non_positive_miles() {
    let account = empty_account();
    let expected = Err(invalid("milhas deve ser positivo para compra"));
    assert_eq!(account.apply_purchase(0, dec!(100.00)), expected);
    assert_eq!(account.apply_purchase(-1_000, dec!(100.00)), expected);
}

#[test]
fn purchase_rejects_negative_value() {
    assert_eq!(
        empty_account().apply_purchase(1_000, dec!(-100.00)),
        Err(invalid("valor nao pode ser negativo"))
    );
}

// === Bonuses ===

#[test]
fn bonus_into_empty_account_is_free() {
    let account = empty_account().apply_bonus(5_000).unwrap();
    assert_eq!(account.balance(), 5_000);
    assert_eq!(account.cost_basis(), Decimal::ZERO);
    assert_eq!(account.average_cost(), Decimal::ZERO);
}

#[test]
fn bonus_dilutes_average_cost() {
    let account = account_with(10_000, dec!(250.00), dec!(25.00));
    let updated = account.apply_bonus(5_000).unwrap();

    assert_eq!(updated.balance(), 15_000);
    assert_eq!(updated.cost_basis(), dec!(250.00));
    assert_eq!(updated.average_cost(), dec!(16.666667));
    assert!(updated.updated_at() >= account.updated_at());
}

#[test]
fn large_bonus() {
    let updated = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_bonus(50_000)
        .unwrap();
    assert_eq!(updated.balance(), 60_000);
    assert_eq!(updated.cost_basis(), dec!(250.00));
    assert_eq!(updated.average_cost(), dec!(4.166667));
}

#[test]
fn bonus_rejects_non_positive_miles() {
    let expected = Err(invalid("milhas deve ser positivo para bonus"));
    assert_eq!(empty_account().apply_bonus(0), expected);
    assert_eq!(account_with(1_000, dec!(10), dec!(10)).apply_bonus(-500), expected);
}

// === Sales ===

#[test]
fn partial_sale_with_profit() {
    let outcome = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_sale(5_000, dec!(150.00))
        .unwrap();

    assert_eq!(outcome.account.balance(), 5_000);
    assert_eq!(outcome.account.cost_basis(), dec!(125.0000));
    assert_eq!(outcome.account.average_cost(), dec!(25.000000));
    assert_eq!(outcome.cost_removed, dec!(125.0000));
    assert_eq!(outcome.profit, dec!(25.0000));
    assert!(!outcome.is_loss());
}

#[test]
fn partial_sale_with_loss() {
    let outcome = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_sale(5_000, dec!(100.00))
        .unwrap();

    assert_eq!(outcome.account.cost_basis(), dec!(125.0000));
    assert_eq!(outcome.cost_removed, dec!(125.0000));
    assert_eq!(outcome.profit, dec!(-25.0000));
    assert!(outcome.is_loss());
}

#[test]
fn break_even_sale() {
    let outcome = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_sale(5_000, dec!(125.00))
        .unwrap();
    assert_eq!(outcome.profit, dec!(0.0000));
    assert!(!outcome.is_loss());
}

#[test]
fn full_sale_zeroes_the_account() {
    let outcome = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_sale(10_000, dec!(300.00))
        .unwrap();

    assert_eq!(outcome.account.balance(), 0);
    assert!(outcome.account.cost_basis().is_zero());
    assert!(outcome.account.average_cost().is_zero());
    assert_eq!(outcome.cost_removed, dec!(250.0000));
    assert_eq!(outcome.profit, dec!(50.0000));
}

#[test]
fn full_sale_after_uneven_sales_leaves_no_dust() {
    // 100 / 3 does not divide evenly at 4 places.
    let account = account_with(3_000, dec!(100.00), dec!(33.333333));
    let first = account.apply_sale(1_000, dec!(40)).unwrap();
    let second = first.account.apply_sale(1_000, dec!(40)).unwrap();
    let last = second.account.apply_sale(1_000, dec!(40)).unwrap();

    assert_eq!(last.account.balance(), 0);
    assert_eq!(last.account.cost_basis(), Decimal::ZERO);
    assert_eq!(
        first.cost_removed + second.cost_removed + last.cost_removed,
        dec!(100.00)
    );
}

#[test]
fn sale_rejects_non_positive_miles() {
    let account = account_with(10_000, dec!(250.00), dec!(25.00));
    let expected = Err(invalid("milhas deve ser positivo para venda"));
    assert_eq!(account.apply_sale(0, dec!(100.00)), expected);
    assert_eq!(account.apply_sale(-1_000, dec!(100.00)), expected);
}

#[test]
fn sale_rejects_negative_value() {
    assert_eq!(
        account_with(10_000, dec!(250.00), dec!(25.00)).apply_sale(1_000, dec!(-50.00)),
        Err(invalid("valorVenda nao pode ser negativo"))
    );
}

#[test]
fn sale_above_balance_is_insufficient() {
    let account = account_with(5_000, dec!(125.00), dec!(25.00));
    let error = account.apply_sale(10_000, dec!(250.00)).unwrap_err();

    assert_eq!(
        error,
        LedgerError::InsufficientBalance {
            program_id: program_id(),
            balance: 5_000,
            requested: 10_000,
        }
    );
    assert_eq!(
        error.to_string(),
        "Saldo de milhas insuficiente no programa aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa: \
         saldo atual = 5000, solicitado = 10000"
    );
    assert_eq!(error.deficit(), Some(5_000));

    // The original value is untouched.
    assert_eq!(account, account_with(5_000, dec!(125.00), dec!(25.00)));
}

#[test]
fn sale_from_empty_account_is_insufficient() {
    let error = empty_account().apply_sale(1_000, dec!(25.00)).unwrap_err();
    assert!(error.to_string().ends_with("saldo atual = 0, solicitado = 1000"));
}

// === Queries ===

#[test]
fn has_balance() {
    assert!(!empty_account().has_balance());
    assert!(account_with(1_000, dec!(25.00), dec!(25.00)).has_balance());
    assert!(account_with(100_000, dec!(2500.00), dec!(25.00)).has_balance());
}

#[test]
fn can_withdraw() {
    let account = account_with(10_000, dec!(250.00), dec!(25.00));
    assert!(!empty_account().can_withdraw(1_000));
    assert!(account.can_withdraw(5_000));
    assert!(account.can_withdraw(10_000));
    assert!(!account.can_withdraw(10_001));
    assert!(!account.can_withdraw(0));
    assert!(!account.can_withdraw(-1_000));
}

// === Complete flows ===

#[test]
fn purchase_bonus_then_sale() {
    let account = Account::open(tenant_id(), program_id(), "Smiles", "Joao Silva")
        .unwrap()
        .apply_purchase(10_000, dec!(250.00))
        .unwrap()
        .apply_bonus(5_000)
        .unwrap();
    assert_eq!(account.average_cost(), dec!(16.666667));

    let outcome = account.apply_sale(5_000, dec!(100.00)).unwrap();
    // 250 * 5000 / 15000 = 83.3333..
    assert_eq!(outcome.cost_removed, dec!(83.3333));
    assert_eq!(outcome.profit, dec!(16.6667));
    assert_eq!(outcome.account.balance(), 10_000);
    assert_eq!(outcome.account.cost_basis(), dec!(166.6667));
}

#[test]
fn account_cycles_through_zero() {
    let emptied = Account::open(tenant_id(), program_id(), "Smiles", "Joao")
        .unwrap()
        .apply_purchase(20_000, dec!(500.00))
        .unwrap()
        .apply_sale(20_000, dec!(600.00))
        .unwrap();
    assert_eq!(emptied.profit, dec!(100.00));

    let refilled = emptied.account.apply_purchase(1_000, dec!(30.00)).unwrap();
    assert_eq!(refilled.balance(), 1_000);
    assert_eq!(refilled.cost_basis(), dec!(30.00));
    assert_eq!(refilled.average_cost(), dec!(30));
}

// === Rehydration ===

#[test]
fn rehydration_requires_identity_fields() {
    let mut missing_id = record(0, Decimal::ZERO, Decimal::ZERO);
    missing_id.id = None;
    assert_eq!(
        Account::try_from(missing_id),
        Err(LedgerError::NullArgument("id"))
    );

    let mut missing_created = record(0, Decimal::ZERO, Decimal::ZERO);
    missing_created.created_at = None;
    let error = Account::try_from(missing_created).unwrap_err();
    assert_eq!(error.to_string(), "criadoEm eh obrigatorio");

    let mut missing_updated = record(0, Decimal::ZERO, Decimal::ZERO);
    missing_updated.updated_at = None;
    assert_eq!(
        Account::try_from(missing_updated),
        Err(LedgerError::NullArgument("atualizadoEm"))
    );
}

#[test]
fn rehydration_defaults_missing_amounts_to_zero() {
    let mut stored = record(1_000, Decimal::ZERO, Decimal::ZERO);
    stored.cost_basis = None;
    stored.average_cost = None;

    let account = Account::try_from(stored).unwrap();
    assert_eq!(account.cost_basis(), Decimal::ZERO);
    assert_eq!(account.average_cost(), Decimal::ZERO);
}

#[test]
fn rehydration_rejects_invariant_violations() {
    let cases = [
        (record(-100, Decimal::ZERO, Decimal::ZERO), "saldoMilhas nao pode ser negativo"),
        (record(1_000, dec!(-100.00), Decimal::ZERO), "custoBaseTotalBRL nao pode ser negativo"),
        (
            record(1_000, dec!(10), dec!(-5.00)),
            "custoMedioMilheiroAtual nao pode ser negativo",
        ),
        (
            record(0, dec!(100.00), Decimal::ZERO),
            "custoBaseTotalBRL deve ser zero quando saldoMilhas eh zero",
        ),
    ];

    for (stored, message) in cases {
        assert_eq!(
            Account::try_from(stored),
            Err(LedgerError::InvariantViolation(message.to_string()))
        );
    }
}

#[test]
fn record_round_trip_preserves_state() {
    let account = account_with(10_000, dec!(250.00), dec!(25.00))
        .apply_bonus(1_000)
        .unwrap();
    let restored = Account::try_from(AccountRecord::from(account.clone())).unwrap();
    assert_eq!(restored, account);
}
