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

//! Concurrent transaction simulation.
//!
//! The [`Simulator`] opens the configured accounts, binds one [`Worker`] per
//! simulated user, runs every worker on its own named thread and waits for
//! all of them, bounded by an optional deadline. The resulting
//! [`SimulationReport`] carries balances and totals before and after.
//!
//! # Worker Binding
//!
//! Worker `i` uses account `i mod N` as primary and, when there are at least
//! two accounts, account `(i + 1) mod N` as secondary.

use crate::account::{Account, BalanceSnapshot};
use crate::base::Amount;
use crate::ledger::Ledger;
use crate::worker::{AmountRange, Worker, WorkerStats};
use crate::SimulationError;
use crossbeam::channel::{self, RecvTimeoutError};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Run parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// One entry per account, in minor currency units.
    pub initial_balances: Vec<Amount>,
    pub workers: usize,
    pub operations_per_worker: usize,
    pub amounts: AmountRange,
    /// Base seed; worker `i` uses `seed + i`.
    pub seed: Option<u64>,
    /// Sleep after each worker iteration.
    pub pause: Duration,
    /// Upper bound on waiting for all workers. `None` waits forever.
    pub join_timeout: Option<Duration>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.initial_balances.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "at least one account is required",
            ));
        }
        if self.workers == 0 {
            return Err(SimulationError::InvalidConfig(
                "at least one worker is required",
            ));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_balances: vec![100_000, 100_000],
            workers: 20,
            operations_per_worker: 1_000,
            amounts: AmountRange::default(),
            seed: None,
            pause: Duration::ZERO,
            join_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Balances and totals around one run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub initial_balances: Vec<BalanceSnapshot>,
    pub final_balances: Vec<BalanceSnapshot>,
    pub initial_total: i128,
    pub final_total: i128,
    pub stats: WorkerStats,
    pub elapsed: Duration,
}

impl SimulationReport {
    /// Initial total adjusted by committed deposits and withdrawals.
    pub fn expected_total(&self) -> i128 {
        self.initial_total + self.stats.net_flow()
    }

    /// Final total matches every committed external flow; transfers moved
    /// money without creating or destroying any.
    pub fn is_consistent(&self) -> bool {
        self.final_total == self.expected_total()
    }

    /// Aggregate total is unchanged. Expected for transfer-only runs.
    pub fn is_conserved(&self) -> bool {
        self.final_total == self.initial_total
    }
}

/// Owns the run's accounts and drives its workers.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    ledger: Ledger,
    /// Accounts in configuration order.
    accounts: Vec<Arc<Account>>,
}

impl Simulator {
    /// Validates `config` and opens accounts `ACC-001`, `ACC-002`, ...
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let ledger = Ledger::new();
        let accounts = config
            .initial_balances
            .iter()
            .enumerate()
            .map(|(i, &balance)| ledger.open_account(format!("ACC-{:03}", i + 1), balance))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            ledger,
            accounts,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Builds the configured workers without starting them.
    pub fn workers(&self) -> Vec<Worker> {
        let n = self.accounts.len();
        (0..self.config.workers)
            .map(|i| {
                let mut worker = Worker::new(
                    i,
                    Arc::clone(&self.accounts[i % n]),
                    self.config.operations_per_worker,
                )
                .with_amounts(self.config.amounts)
                .with_pause(self.config.pause);

                if n >= 2 {
                    worker = worker.with_secondary(Arc::clone(&self.accounts[(i + 1) % n]));
                }
                if let Some(seed) = self.config.seed {
                    worker = worker.with_seed(seed.wrapping_add(i as u64));
                }
                worker
            })
            .collect()
    }

    /// Runs all workers to completion.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Stalled`] - the join deadline expired. Unfinished
    ///   worker threads are left detached.
    /// - [`SimulationError::WorkerPanicked`] - a worker thread panicked.
    /// - [`SimulationError::Spawn`] - the OS refused a new thread.
    pub fn run(&self) -> Result<SimulationReport, SimulationError> {
        let initial_balances = self.ledger.snapshot();
        let initial_total = self.ledger.total_balance();
        let workers = self.workers();
        let expected = workers.len();

        info!(
            accounts = self.accounts.len(),
            workers = expected,
            operations = self.config.operations_per_worker,
            initial_total = %initial_total,
            "starting simulation"
        );

        let started = Instant::now();
        let (tx, rx) = channel::unbounded::<(usize, WorkerStats)>();
        let mut handles = Vec::with_capacity(expected);

        for worker in workers {
            let id = worker.id();
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("user-{id}"))
                .spawn(move || {
                    let stats = worker.run();
                    // The receiver is gone only if the run already timed out.
                    let _ = tx.send((id, stats));
                })?;
            handles.push((id, handle));
        }
        // Only worker threads hold senders now, so a disconnect means they all exited.
        drop(tx);

        let deadline = self.config.join_timeout.map(|timeout| started + timeout);
        let mut stats = WorkerStats::default();
        let mut finished = 0;

        while finished < expected {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((_, worker_stats)) => {
                    stats.merge(&worker_stats);
                    finished += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(finished, expected, "workers did not finish before the deadline");
                    return Err(SimulationError::Stalled { finished, expected });
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for (id, handle) in handles {
            if handle.join().is_err() {
                return Err(SimulationError::WorkerPanicked(id));
            }
        }

        let report = SimulationReport {
            initial_balances,
            final_balances: self.ledger.snapshot(),
            initial_total,
            final_total: self.ledger.total_balance(),
            stats,
            elapsed: started.elapsed(),
        };

        info!(
            final_total = %report.final_total,
            expected_total = %report.expected_total(),
            committed = report.stats.committed(),
            insufficient_funds = report.stats.insufficient_funds,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "simulation finished"
        );
        Ok(report)
    }
}
