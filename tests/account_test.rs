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

use concurrent_ledger::{Account, Ledger, LedgerError};
use std::sync::Arc;
use std::thread;

// === Helper Functions ===

fn account(id: &str, balance: i64) -> Account {
    Account::new(id, balance).unwrap()
}

// === Basic Account Tests ===

#[test]
fn new_account_reports_initial_balance() {
    let account = account("ACC-001", 1_500);
    assert_eq!(account.id().as_str(), "ACC-001");
    assert_eq!(account.balance(), 1_500);
}

#[test]
fn zero_initial_balance_is_allowed() {
    assert_eq!(account("ACC-001", 0).balance(), 0);
}

#[test]
fn deposit_then_withdraw() {
    let account = account("TEST-001", 0);
    account.deposit(10_000).unwrap();
    account.withdraw(4_000).unwrap();
    assert_eq!(account.balance(), 6_000);
}

#[test]
fn withdraw_entire_balance() {
    let account = account("TEST-001", 2_000);
    account.withdraw(2_000).unwrap();
    assert_eq!(account.balance(), 0);
}

#[test]
fn transfer_moves_funds() {
    let a = account("ACC-A", 1_000);
    let b = account("ACC-B", 500);
    a.transfer_to(Some(&b), 300).unwrap();
    assert_eq!(a.balance(), 700);
    assert_eq!(b.balance(), 800);

    // Reverse direction locks in the same order.
    b.transfer_to(Some(&a), 800).unwrap();
    assert_eq!(a.balance(), 1_500);
    assert_eq!(b.balance(), 0);
}

// === Error Cases ===

#[test]
fn withdraw_more_than_balance_returns_insufficient_funds() {
    let account = account("TEST-002", 2_000);
    assert_eq!(account.withdraw(3_000), Err(LedgerError::InsufficientFunds));
    assert_eq!(account.balance(), 2_000);
}

#[test]
fn non_positive_amounts_return_invalid_argument() {
    let a = account("TEST-003", 1_000);
    let b = account("TEST-004", 1_000);

    assert!(matches!(a.deposit(0), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(a.deposit(-1), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(a.withdraw(0), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(a.withdraw(-100), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(
        a.transfer_to(Some(&b), 0),
        Err(LedgerError::InvalidArgument(_))
    ));
    assert!(matches!(
        a.transfer_to(Some(&b), -5),
        Err(LedgerError::InvalidArgument(_))
    ));

    assert_eq!(a.balance(), 1_000);
    assert_eq!(b.balance(), 1_000);
}

#[test]
fn self_transfer_returns_invalid_operation() {
    for balance in [0, 1, 1_000] {
        let account = account("TEST-005", balance);
        assert!(matches!(
            account.transfer_to(Some(&account), 1),
            Err(LedgerError::InvalidOperation(_))
        ));
        assert_eq!(account.balance(), balance);
    }
}

#[test]
fn missing_target_returns_invalid_operation() {
    let account = account("TEST-006", 100);
    assert!(matches!(
        account.transfer_to(None, 10),
        Err(LedgerError::InvalidOperation(_))
    ));
    assert_eq!(account.balance(), 100);
}

#[test]
fn overdrawn_transfer_changes_nothing() {
    let a = account("ACC-A", 100);
    let b = account("ACC-B", 50);
    assert_eq!(a.transfer_to(Some(&b), 101), Err(LedgerError::InsufficientFunds));
    assert_eq!(a.balance(), 100);
    assert_eq!(b.balance(), 50);
}

#[test]
fn construction_rejects_invalid_input() {
    assert!(matches!(Account::new("", 0), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(Account::new("   ", 0), Err(LedgerError::InvalidArgument(_))));
    assert!(matches!(Account::new("ACC", -1), Err(LedgerError::InvalidArgument(_))));
}

// === Concurrency Tests ===

#[test]
fn concurrent_deposit_withdraw_pairs_leave_balance_unchanged() {
    const INITIAL: i64 = 50_000;
    let account = Arc::new(account("CONC-001", INITIAL));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let account = Arc::clone(&account);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    account.deposit(100).unwrap();
                    account.withdraw(100).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(account.balance(), INITIAL);
}

#[test]
fn concurrent_withdrawals_never_overdraw() {
    let account = Arc::new(account("CONC-002", 10_000));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let account = Arc::clone(&account);
            thread::spawn(move || {
                let mut succeeded = 0;
                for _ in 0..100 {
                    if account.withdraw(7).is_ok() {
                        succeeded += 1;
                    }
                }
                succeeded
            })
        })
        .collect();

    let succeeded: i64 = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .sum();

    // 10_000 / 7 = 1428 full withdrawals fit.
    assert_eq!(succeeded, 1_428);
    assert_eq!(account.balance(), 10_000 - 7 * 1_428);
}

#[test]
fn concurrent_transfers_preserve_total() {
    let ledger = Ledger::new();
    let a = ledger.open_account("ACC-A", 100_000).unwrap();
    let b = ledger.open_account("ACC-B", 200_000).unwrap();

    let handles: Vec<_> = (0..30)
        .map(|_| {
            let a = Arc::clone(&a);
            let b = Arc::clone(&b);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let _ = a.transfer_to(Some(b.as_ref()), 50);
                    let _ = b.transfer_to(Some(a.as_ref()), 50);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(ledger.total_balance(), 300_000);
}
