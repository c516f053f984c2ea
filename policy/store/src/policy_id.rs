// Copyright 2025 The Verdict Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite policy identifier: (scope, tenant, name).
///
/// Serializes to the opaque store key `scope://tenant/name` and parses
/// back losslessly. `scope` and `tenant` may not contain `:` or `/`, so
/// the separators are unambiguous and `from_store_key(store_key())`
/// round-trips for every id the store accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId {
    pub scope: String,
    pub tenant: String,
    pub name: String,
}

impl PolicyId {
    /// Fails with `MalformedKey` on empty segments or separator
    /// characters in `scope`/`tenant`, so every constructible id has a
    /// parseable store key.
    pub fn new(scope: &str, tenant: &str, name: &str) -> Result<Self, Error> {
        let id = Self {
            scope: scope.to_string(),
            tenant: tenant.to_string(),
            name: name.to_string(),
        };
        if scope.is_empty()
            || tenant.is_empty()
            || name.is_empty()
            || scope.contains([':', '/'])
            || tenant.contains([':', '/'])
        {
            return Err(Error::MalformedKey(id.store_key()));
        }
        Ok(id)
    }

    /// The single opaque key this id is stored under.
    pub fn store_key(&self) -> String {
        format!("{}://{}/{}", self.scope, self.tenant, self.name)
    }

    /// Parse a store key back into its id. Fails on empty segments or
    /// separator characters inside `scope`/`tenant`.
    pub fn from_store_key(key: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedKey(key.to_string());

        let (scope, rest) = key.split_once("://").ok_or_else(malformed)?;
        let (tenant, name) = rest.split_once('/').ok_or_else(malformed)?;

        Self::new(scope, tenant, name).map_err(|_| malformed())
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.store_key())
    }
}
