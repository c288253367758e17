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

//! Two-account transfer protocol.
//!
//! ```text
//! Idle ─► AcquireLowerLock ─► AcquireHigherLock ─► ValidateFunds ─┬─► Commit ─┐
//!                                                                 └─► Abort ──┴─► ReleaseLocks ─► Idle
//! ```
//!
//! Every transfer locks the account with the smaller [`AccountId`] first,
//! regardless of direction. All transfers touching a given pair therefore
//! request the two locks in the same order and the wait-for graph cannot
//! contain a cycle. Funds are validated only once both guards are held.
//!
//! [`AccountId`]: crate::AccountId

use crate::LedgerError;
use crate::account::{Account, AccountData};
use crate::base::Amount;
use parking_lot::MutexGuard;
use tracing::trace;

/// Locks both accounts in id order, returning `(source, target)` guards.
///
/// Callers must ensure the two accounts have distinct ids.
pub(crate) fn lock_pair<'a>(
    source: &'a Account,
    target: &'a Account,
) -> (MutexGuard<'a, AccountData>, MutexGuard<'a, AccountData>) {
    debug_assert_ne!(source.id(), target.id());

    if source.id() < target.id() {
        trace!(lower = %source.id(), higher = %target.id(), "acquire lower lock (source)");
        let from = source.lock();
        trace!(higher = %target.id(), "acquire higher lock (target)");
        let to = target.lock();
        (from, to)
    } else {
        trace!(lower = %target.id(), higher = %source.id(), "acquire lower lock (target)");
        let to = target.lock();
        trace!(higher = %source.id(), "acquire higher lock (source)");
        let from = source.lock();
        (from, to)
    }
}

/// Runs the validate-then-commit step with both locks held.
///
/// The amount must already be positive. Guards drop on every return path.
pub(crate) fn execute(source: &Account, target: &Account, amount: Amount) -> Result<(), LedgerError> {
    let (mut from, mut to) = lock_pair(source, target);

    if amount > from.balance() {
        trace!(source = %source.id(), target = %target.id(), amount, "abort: insufficient funds");
        return Err(LedgerError::InsufficientFunds);
    }
    to.ensure_can_credit(amount)?;

    from.debit(amount)?;
    to.credit(amount)?;
    trace!(source = %source.id(), target = %target.id(), amount, "commit");
    Ok(())
}
