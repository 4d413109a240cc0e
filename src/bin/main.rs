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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use milhas_ledger::{
    Command, CostRounding, Engine, LedgerError, ProgramId, RoundingConfig, RoundingMode, Target,
    TenantId, TransactionKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Miles Ledger - Apply a CSV of miles transactions
///
/// Reads purchases, bonuses and sales from a CSV file and writes the resulting
/// account balances, cost basis and average cost to stdout.
/// Logging goes to stderr and is controlled by `RUST_LOG` (default: warn).
#[derive(Parser, Debug)]
#[command(name = "milhas-ledger")]
#[command(about = "Weighted-average cost ledger for loyalty miles", long_about = None)]
struct Args {
    /// Path to CSV file with transactions
    ///
    /// Expected format: type,tenant,program,program_name,owner,miles,value,source,note
    /// Example: cargo run -- transactions.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Decimal places for cost basis, removed cost and profit (0-6)
    #[arg(long, default_value_t = 4)]
    money_scale: u32,

    /// Decimal places for the average cost per thousand miles (0-6)
    #[arg(long, default_value_t = 6)]
    average_scale: u32,

    /// Rounding mode for both scales
    #[arg(long, value_enum, default_value_t = RoundingArg::HalfUp)]
    rounding: RoundingArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoundingArg {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

impl From<RoundingArg> for RoundingMode {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::Up => RoundingMode::Up,
            RoundingArg::Down => RoundingMode::Down,
            RoundingArg::Ceiling => RoundingMode::Ceiling,
            RoundingArg::Floor => RoundingMode::Floor,
            RoundingArg::HalfUp => RoundingMode::HalfUp,
            RoundingArg::HalfDown => RoundingMode::HalfDown,
            RoundingArg::HalfEven => RoundingMode::HalfEven,
        }
    }
}

impl Args {
    fn cost_rounding(&self) -> Result<CostRounding, LedgerError> {
        let mode = RoundingMode::from(self.rounding);
        Ok(CostRounding {
            monetary: RoundingConfig::new(self.money_scale, mode)?,
            average_cost: RoundingConfig::new(self.average_scale, mode)?,
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let rounding = match args.cost_rounding() {
        Ok(rounding) => rounding,
        Err(e) => {
            error!("invalid rounding configuration: {}", e);
            process::exit(2);
        }
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            error!("error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let batch = match process_transactions(BufReader::new(file), Engine::with_rounding(rounding)) {
        Ok(batch) => batch,
        Err(e) => {
            error!("error processing transactions: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&batch, std::io::stdout()) {
        error!("error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, tenant, program, program_name, owner, miles, value, source, note`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    tx_type: String,
    tenant: Uuid,
    program: Uuid,
    program_name: String,
    owner: String,
    miles: i64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    value: Option<Decimal>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl CsvRecord {
    /// Converts the record into an engine command.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - unknown transaction type.
    /// - [`LedgerError::NullArgument`] - purchase or sale without a value.
    fn into_command(self) -> Result<Command, LedgerError> {
        let kind = match self.tx_type.to_lowercase().as_str() {
            "compra" | "purchase" => TransactionKind::Purchase,
            "bonus" => TransactionKind::Bonus,
            "venda" | "sale" => TransactionKind::Sale,
            other => {
                return Err(LedgerError::InvalidArgument(format!(
                    "tipo de transacao desconhecido: {other}"
                )));
            }
        };
        let target = Target {
            tenant_id: TenantId(self.tenant),
            program_id: ProgramId(self.program),
            program_name: self.program_name,
            owner: self.owner,
        };
        Command::from_parts(kind, target, self.miles, self.value, self.source, self.note)
    }
}

/// Engine state after a batch, plus the tenants it touched.
struct Batch {
    engine: Engine,
    tenants: BTreeSet<TenantId>,
}

/// Process transactions from a CSV reader.
///
/// Rows are streamed, so arbitrarily large files are never held in memory.
/// Malformed rows and rejected transitions are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `type, tenant, program, program_name, owner, miles, value, source, note`
/// - `type`: `compra`, `bonus` or `venda`
/// - `tenant`, `program`: UUIDs
/// - `miles`: integer quantity
/// - `value`: decimal amount (empty for bonuses)
/// - `source`, `note`: optional free text
///
/// # Example
///
/// ```csv
/// type,tenant,program,program_name,owner,miles,value,source,note
/// compra,11111111-1111-1111-1111-111111111111,aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa,Smiles,Joao,10000,250.00,site,
/// bonus,11111111-1111-1111-1111-111111111111,aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa,Smiles,Joao,5000,,cartao,
/// venda,11111111-1111-1111-1111-111111111111,aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa,Smiles,Joao,5000,150.00,,cliente
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the header is unreadable.
fn process_transactions<R: Read>(reader: R, engine: Engine) -> Result<Batch, csv::Error> {
    let mut tenants = BTreeSet::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (line, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line + 1, "skipping malformed row: {}", e);
                continue;
            }
        };

        let command = match record.into_command() {
            Ok(command) => command,
            Err(e) => {
                warn!(line = line + 1, "skipping invalid row: {}", e);
                continue;
            }
        };

        let tenant_id = command.target().tenant_id;
        match engine.process(command) {
            Ok(_) => {
                tenants.insert(tenant_id);
            }
            Err(e) => warn!(line = line + 1, "skipping transaction: {}", e),
        }
    }

    Ok(Batch { engine, tenants })
}

/// One output row per account.
#[derive(Debug, Serialize)]
struct AccountRow<'a> {
    tenant: TenantId,
    program: ProgramId,
    program_name: &'a str,
    owner: &'a str,
    balance: i64,
    cost_basis: Decimal,
    average_cost: Decimal,
}

/// Write account states to a CSV writer.
///
/// # CSV Format
///
/// Columns: `tenant, program, program_name, owner, balance, cost_basis, average_cost`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_accounts<W: Write>(batch: &Batch, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for tenant_id in &batch.tenants {
        for account in batch.engine.accounts(*tenant_id) {
            wtr.serialize(AccountRow {
                tenant: account.tenant_id(),
                program: account.program_id(),
                program_name: account.program_name(),
                owner: account.owner(),
                balance: account.balance(),
                cost_basis: account.cost_basis(),
                average_cost: account.average_cost(),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
