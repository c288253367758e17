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

//! Error types for account operations and simulation runs.

use thiserror::Error;

/// Account operation errors.
///
/// All variants are returned before any balance is mutated, so an `Err`
/// always means the ledger is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Non-positive amount, negative initial balance, empty id, or overflow
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Withdrawal or transfer exceeds the current balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Missing transfer target, self-transfer, or duplicate account id
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

/// Simulation errors.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Workers did not finish before the join deadline.
    #[error("run stalled: {finished} of {expected} workers finished before the deadline (suspected deadlock)")]
    Stalled { finished: usize, expected: usize },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
