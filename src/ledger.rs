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

//! The set of accounts owned by one run.
//!
//! The [`Ledger`] is the sole creator of accounts. It hands out shared
//! [`Arc<Account>`] handles to workers, which only ever call account
//! operations and never create or remove accounts themselves.
//!
//! # Thread Safety
//!
//! Accounts are indexed in a [`DashMap`], so lookups and account creation can
//! happen concurrently. The map shards are never held while an account lock
//! is taken by this module.

use crate::account::{Account, BalanceSnapshot};
use crate::base::{AccountId, Amount};
use crate::LedgerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Owning collection of accounts with globally unique ids.
///
/// # Invariants
///
/// - No two accounts share an id, which keeps the transfer lock order total.
/// - Accounts are never removed for the lifetime of the ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArgument`] - blank id or negative balance.
    /// - [`LedgerError::InvalidOperation`] - an account with this id exists.
    pub fn open_account(
        &self,
        id: impl Into<String>,
        initial_balance: Amount,
    ) -> Result<Arc<Account>, LedgerError> {
        let account = Account::new(id, initial_balance)?;

        // Entry API keeps the uniqueness check and the insert atomic.
        match self.accounts.entry(account.id().clone()) {
            Entry::Occupied(_) => Err(LedgerError::InvalidOperation("duplicate account id")),
            Entry::Vacant(entry) => {
                let account = Arc::new(account);
                entry.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Account>> {
        let id = AccountId::new(id).ok()?;
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns handles to every account, sorted by id.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        accounts
    }

    /// Per-account balances, sorted by id.
    ///
    /// Each balance is read under its own lock; the set as a whole is only a
    /// consistent cut once no operations are in flight.
    pub fn snapshot(&self) -> Vec<BalanceSnapshot> {
        self.accounts().iter().map(|account| account.snapshot()).collect()
    }

    /// Sum of all balances. Same consistency caveat as [`Ledger::snapshot`].
    pub fn total_balance(&self) -> i128 {
        self.accounts()
            .iter()
            .map(|account| i128::from(account.balance()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_account_rejects_duplicate_id() {
        let ledger = Ledger::new();
        ledger.open_account("ACC-001", 10).unwrap();
        assert_eq!(
            ledger.open_account("ACC-001", 20).unwrap_err(),
            LedgerError::InvalidOperation("duplicate account id")
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("ACC-001").unwrap().balance(), 10);
    }

    #[test]
    fn open_account_propagates_validation_errors() {
        let ledger = Ledger::new();
        assert!(matches!(
            ledger.open_account("", 10),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.open_account("ACC-001", -5),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn handles_share_the_same_account() {
        let ledger = Ledger::new();
        let handle = ledger.open_account("ACC-001", 0).unwrap();
        handle.deposit(250).unwrap();
        assert_eq!(ledger.get("ACC-001").unwrap().balance(), 250);
    }

    #[test]
    fn get_unknown_or_blank_id() {
        let ledger = Ledger::new();
        assert!(ledger.get("missing").is_none());
        assert!(ledger.get("").is_none());
    }

    #[test]
    fn snapshot_sorted_by_id() {
        let ledger = Ledger::new();
        ledger.open_account("C", 3).unwrap();
        ledger.open_account("A", 1).unwrap();
        ledger.open_account("B", 2).unwrap();

        let ids: Vec<_> = ledger
            .snapshot()
            .into_iter()
            .map(|s| (s.id.to_string(), s.balance))
            .collect();
        assert_eq!(
            ids,
            vec![("A".to_string(), 1), ("B".to_string(), 2), ("C".to_string(), 3)]
        );
    }

    #[test]
    fn total_balance_does_not_overflow() {
        let ledger = Ledger::new();
        ledger.open_account("A", Amount::MAX).unwrap();
        ledger.open_account("B", Amount::MAX).unwrap();
        assert_eq!(ledger.total_balance(), 2 * i128::from(Amount::MAX));
    }
}
