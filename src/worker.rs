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

//! Simulated users issuing randomized account operations.
//!
//! A [`Worker`] is plain data: account handles, an iteration count and the
//! amount bounds. It does not own a thread; whoever calls [`Worker::run`]
//! decides where it executes.

use crate::account::Account;
use crate::base::Amount;
use crate::LedgerError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Inclusive bounds for randomly generated operation amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmountRange {
    min: Amount,
    max: Amount,
}

impl AmountRange {
    /// # Errors
    ///
    /// [`LedgerError::InvalidArgument`] unless `0 < min <= max`.
    pub fn new(min: Amount, max: Amount) -> Result<Self, LedgerError> {
        if min <= 0 {
            return Err(LedgerError::InvalidArgument("minimum amount must be positive"));
        }
        if min > max {
            return Err(LedgerError::InvalidArgument(
                "minimum amount must not exceed maximum",
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Amount {
        self.min
    }

    pub fn max(&self) -> Amount {
        self.max
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Amount {
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for AmountRange {
    /// 1.00 to 100.00 in cents.
    fn default() -> Self {
        Self { min: 100, max: 10_000 }
    }
}

/// One randomly chosen worker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit,
    Withdraw,
    /// `forward` moves funds primary -> secondary, otherwise the reverse.
    Transfer { forward: bool },
}

/// Outcome counters for one or more workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub deposits: u64,
    pub withdrawals: u64,
    pub transfers: u64,
    /// Withdrawals and transfers rejected for lack of funds.
    pub insufficient_funds: u64,
    /// Any other rejected operation.
    pub rejected: u64,
    /// Sum of committed deposits.
    pub deposited: i128,
    /// Sum of committed withdrawals.
    pub withdrawn: i128,
}

impl WorkerStats {
    pub fn merge(&mut self, other: &WorkerStats) {
        self.deposits += other.deposits;
        self.withdrawals += other.withdrawals;
        self.transfers += other.transfers;
        self.insufficient_funds += other.insufficient_funds;
        self.rejected += other.rejected;
        self.deposited += other.deposited;
        self.withdrawn += other.withdrawn;
    }

    /// Operations that committed.
    pub fn committed(&self) -> u64 {
        self.deposits + self.withdrawals + self.transfers
    }

    /// Net money that entered the ledger from outside (deposits - withdrawals).
    pub fn net_flow(&self) -> i128 {
        self.deposited - self.withdrawn
    }

    fn record(
        &mut self,
        worker: usize,
        operation: Operation,
        amount: Amount,
        result: Result<(), LedgerError>,
    ) {
        match (result, operation) {
            (Ok(()), Operation::Deposit) => {
                self.deposits += 1;
                self.deposited += i128::from(amount);
            }
            (Ok(()), Operation::Withdraw) => {
                self.withdrawals += 1;
                self.withdrawn += i128::from(amount);
            }
            (Ok(()), Operation::Transfer { .. }) => self.transfers += 1,
            (Err(LedgerError::InsufficientFunds), _) => self.insufficient_funds += 1,
            (Err(e), _) => {
                debug!(worker, ?operation, amount, error = %e, "operation rejected");
                self.rejected += 1;
            }
        }
    }
}

/// A simulated user bound to a primary and optional secondary account.
#[derive(Debug, Clone)]
pub struct Worker {
    id: usize,
    primary: Arc<Account>,
    secondary: Option<Arc<Account>>,
    operations: usize,
    amounts: AmountRange,
    seed: Option<u64>,
    pause: Duration,
}

impl Worker {
    pub fn new(id: usize, primary: Arc<Account>, operations: usize) -> Self {
        Self {
            id,
            primary,
            secondary: None,
            operations,
            amounts: AmountRange::default(),
            seed: None,
            pause: Duration::ZERO,
        }
    }

    /// Enables transfers between the primary and `secondary`.
    pub fn with_secondary(mut self, secondary: Arc<Account>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_amounts(mut self, amounts: AmountRange) -> Self {
        self.amounts = amounts;
        self
    }

    /// Makes the operation stream reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sleeps this long after each iteration.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Runs every iteration on the calling thread.
    ///
    /// Individual failures never stop the loop.
    pub fn run(self) -> WorkerStats {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut stats = WorkerStats::default();

        for _ in 0..self.operations {
            let operation = self.choose_operation(&mut rng);
            let amount = self.amounts.sample(&mut rng);
            let result = self.apply(operation, amount);
            stats.record(self.id, operation, amount, result);

            if !self.pause.is_zero() {
                std::thread::sleep(self.pause);
            }
        }

        debug!(worker = self.id, committed = stats.committed(), "worker finished");
        stats
    }

    fn choose_operation<R: Rng + ?Sized>(&self, rng: &mut R) -> Operation {
        let choices = if self.secondary.is_some() { 3 } else { 2 };
        match rng.gen_range(0..choices) {
            0 => Operation::Deposit,
            1 => Operation::Withdraw,
            _ => Operation::Transfer {
                forward: rng.gen_bool(0.5),
            },
        }
    }

    fn apply(&self, operation: Operation, amount: Amount) -> Result<(), LedgerError> {
        match operation {
            Operation::Deposit => self.primary.deposit(amount),
            Operation::Withdraw => self.primary.withdraw(amount),
            Operation::Transfer { forward: true } => {
                self.primary.transfer_to(self.secondary.as_deref(), amount)
            }
            Operation::Transfer { forward: false } => match self.secondary.as_deref() {
                Some(secondary) => secondary.transfer_to(Some(self.primary.as_ref()), amount),
                None => Err(LedgerError::InvalidOperation("transfer target is missing")),
            },
        }
    }
}
