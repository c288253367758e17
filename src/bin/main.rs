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

use clap::Parser;
use concurrent_ledger::{Amount, AmountRange, BalanceSnapshot, SimulationConfig, Simulator};
use csv::Writer;
use std::io::Write;
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Concurrent Ledger - Run a multi-threaded transaction simulation
///
/// Opens one account per initial balance, runs the workers concurrently and
/// writes final balances as CSV to stdout. Logs go to stderr (see RUST_LOG).
#[derive(Parser, Debug)]
#[command(name = "concurrent-ledger")]
#[command(about = "Simulates concurrent deposits, withdrawals and transfers", long_about = None)]
struct Args {
    /// Initial balances in minor units, one per account
    #[arg(long, value_delimiter = ',', default_values_t = [100_000, 100_000])]
    balances: Vec<Amount>,

    /// Number of simulated users
    #[arg(long, default_value_t = 20)]
    workers: usize,

    /// Operations per user
    #[arg(long, default_value_t = 1_000)]
    operations: usize,

    /// Smallest generated amount
    #[arg(long, default_value_t = 100)]
    min_amount: Amount,

    /// Largest generated amount
    #[arg(long, default_value_t = 10_000)]
    max_amount: Amount,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Sleep after each operation, in microseconds
    #[arg(long, default_value_t = 0)]
    pause_micros: u64,

    /// Give up waiting for workers after this many seconds (0 waits forever)
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<SimulationConfig, concurrent_ledger::LedgerError> {
        Ok(SimulationConfig {
            initial_balances: self.balances,
            workers: self.workers,
            operations_per_worker: self.operations,
            amounts: AmountRange::new(self.min_amount, self.max_amount)?,
            seed: self.seed,
            pause: Duration::from_micros(self.pause_micros),
            join_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid arguments: {}", e);
            process::exit(1);
        }
    };

    let simulator = match Simulator::new(config) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!("Error setting up simulation: {}", e);
            process::exit(1);
        }
    };

    let report = match simulator.run() {
        Ok(report) => report,
        Err(e) => {
            error!("Simulation failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&report.final_balances, std::io::stdout()) {
        error!("Error writing output: {}", e);
        process::exit(1);
    }

    info!(
        initial_total = %report.initial_total,
        final_total = %report.final_total,
        expected_total = %report.expected_total(),
        "totals"
    );
    if !report.is_consistent() {
        error!("Final total does not match committed deposits and withdrawals");
        process::exit(1);
    }
}

/// Write balances as CSV.
///
/// # CSV Format
///
/// ```csv
/// id,balance
/// ACC-001,98500
/// ACC-002,101500
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_balances<W: Write>(balances: &[BalanceSnapshot], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for balance in balances {
        wtr.serialize(balance)?;
    }
    wtr.flush()?;
    Ok(())
}
