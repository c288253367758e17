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

//! Account management.
//!
//! An [`Account`] is the unit of consistency: its balance lives behind the
//! account's own mutex and is only reachable through the methods below.
//!
//! # Example
//!
//! ```
//! use concurrent_ledger::{Account, LedgerError};
//!
//! let a = Account::new("ACC-001", 100).unwrap();
//! let b = Account::new("ACC-002", 0).unwrap();
//!
//! a.transfer_to(Some(&b), 40).unwrap();
//! assert_eq!(a.balance(), 60);
//! assert_eq!(b.balance(), 40);
//!
//! assert_eq!(a.withdraw(1_000), Err(LedgerError::InsufficientFunds));
//! ```

use crate::base::{AccountId, Amount};
use crate::{LedgerError, transfer};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize, Serializer};

/// Rejects zero and negative operation amounts.
pub(crate) fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidArgument("amount must be positive"));
    }
    Ok(())
}

/// Balance state guarded by the account mutex.
///
/// Methods here assume the caller already holds the lock and has validated
/// the amount.
#[derive(Debug)]
pub(crate) struct AccountData {
    balance: Amount,
}

impl AccountData {
    fn new(balance: Amount) -> Self {
        Self { balance }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= 0,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub(crate) fn balance(&self) -> Amount {
        self.balance
    }

    /// Fails if crediting `amount` would overflow the balance.
    pub(crate) fn ensure_can_credit(&self, amount: Amount) -> Result<(), LedgerError> {
        self.balance
            .checked_add(amount)
            .map(|_| ())
            .ok_or(LedgerError::InvalidArgument("amount overflows balance"))
    }

    /// Increases the balance.
    pub(crate) fn credit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidArgument("amount overflows balance"))?;
        self.assert_invariants();
        Ok(())
    }

    /// Decreases the balance; the sufficiency check and the decrement share
    /// one lock hold.
    pub(crate) fn debit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }
}

/// Point-in-time view of one account, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub id: AccountId,
    pub balance: Amount,
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    inner: Mutex<AccountData>,
}

impl Account {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidArgument`] if `id` is blank or `initial_balance`
    /// is negative.
    pub fn new(id: impl Into<String>, initial_balance: Amount) -> Result<Self, LedgerError> {
        let id = AccountId::new(id)?;
        if initial_balance < 0 {
            return Err(LedgerError::InvalidArgument(
                "initial balance must not be negative",
            ));
        }
        Ok(Self {
            id,
            inner: Mutex::new(AccountData::new(initial_balance)),
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn balance(&self) -> Amount {
        self.inner.lock().balance()
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            id: self.id.clone(),
            balance: self.balance(),
        }
    }

    pub fn deposit(&self, amount: Amount) -> Result<(), LedgerError> {
        ensure_positive(amount)?;
        self.inner.lock().credit(amount)
    }

    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - `amount` is not positive.
    /// - [`LedgerError::InsufficientFunds`] - `amount` exceeds the balance.
    pub fn withdraw(&self, amount: Amount) -> Result<(), LedgerError> {
        ensure_positive(amount)?;
        self.inner.lock().debit(amount)
    }

    /// Atomically moves `amount` from this account to `target`.
    ///
    /// Both locks are taken in account-id order whatever the direction, so
    /// concurrent transfers between the same pair can never deadlock. See
    /// [`crate::transfer`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidOperation`] - `target` is `None`, is this
    ///   account, or is a distinct account with the same id.
    /// - [`LedgerError::InvalidArgument`] - `amount` is not positive, or would
    ///   overflow the target balance.
    /// - [`LedgerError::InsufficientFunds`] - `amount` exceeds this balance;
    ///   neither balance changes.
    pub fn transfer_to(&self, target: Option<&Account>, amount: Amount) -> Result<(), LedgerError> {
        let target = target.ok_or(LedgerError::InvalidOperation("transfer target is missing"))?;
        if std::ptr::eq(self, target) {
            return Err(LedgerError::InvalidOperation(
                "cannot transfer to the same account",
            ));
        }
        // Equal ids would make the lock order ambiguous.
        if self.id == target.id {
            return Err(LedgerError::InvalidOperation(
                "distinct accounts share the same id",
            ));
        }
        ensure_positive(amount)?;
        transfer::execute(self, target, amount)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }

    #[cfg(test)]
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, AccountData>> {
        self.inner.try_lock()
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.snapshot().serialize(serializer)
    }
}
