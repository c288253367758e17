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

//! Core identifier and amount types.

use crate::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance or operation amount in minor currency units (e.g. cents).
///
/// Signed so that negative inputs can be rejected instead of wrapping.
pub type Amount = i64;

/// Unique identifier for an account.
///
/// The derived `Ord` (lexicographic on the underlying string) is the global
/// order in which transfers acquire account locks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an identifier, rejecting empty or whitespace-only strings.
    pub fn new(id: impl Into<String>) -> Result<Self, LedgerError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LedgerError::InvalidArgument("account id must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_blank_ids() {
        assert!(matches!(AccountId::new(""), Err(LedgerError::InvalidArgument(_))));
        assert!(matches!(AccountId::new("   \t"), Err(LedgerError::InvalidArgument(_))));
    }

    #[test]
    fn keeps_id_verbatim() {
        let id = AccountId::new(" ACC-001 ").unwrap();
        assert_eq!(id.as_str(), " ACC-001 ");
        assert_eq!(id.to_string(), " ACC-001 ");
    }

    #[test]
    fn orders_lexicographically() {
        let a = AccountId::new("ACC-002").unwrap();
        let b = AccountId::new("ACC-010").unwrap();
        let c = AccountId::new("BBB").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AccountId::new("AAA").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"AAA\"");
    }
}
