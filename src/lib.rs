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

//! # Concurrent Ledger
//!
//! This library provides a set of mutable account balances that many threads
//! can deposit to, withdraw from and transfer between at the same time,
//! without negative balances, lost updates or deadlocks.
//!
//! ## Core Components
//!
//! - [`Account`]: Balance guarded by its own mutex
//! - [`transfer`]: Lock ordering protocol for two-account transfers
//! - [`Ledger`]: Owning collection of accounts with unique ids
//! - [`Worker`]: Simulated user issuing random operations
//! - [`Simulator`]: Runs workers concurrently and reports totals
//! - [`LedgerError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use concurrent_ledger::{SimulationConfig, Simulator};
//!
//! let config = SimulationConfig {
//!     workers: 4,
//!     operations_per_worker: 100,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let report = Simulator::new(config).unwrap().run().unwrap();
//!
//! assert!(report.is_consistent());
//! ```
//!
//! ## Thread Safety
//!
//! There is no global lock. Operations on disjoint accounts run fully in
//! parallel; only operations sharing an account serialize on that account's
//! lock.

pub mod account;
mod base;
pub mod error;
mod ledger;
mod simulator;
pub mod transfer;
mod worker;

pub use account::{Account, BalanceSnapshot};
pub use base::{AccountId, Amount};
pub use error::{LedgerError, SimulationError};
pub use ledger::Ledger;
pub use simulator::{SimulationConfig, SimulationReport, Simulator};
pub use worker::{AmountRange, Operation, Worker, WorkerStats};
