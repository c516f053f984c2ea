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

//! Generic multi-value key/value capability.
//!
//! Policies, trust anchors and endorsements all live behind this trait.
//! A key maps to an ordered sequence of opaque string values; `add`
//! appends, which is what gives the policy store its cheap versioning.

pub use memory::MemoryKvStore;

use thiserror::Error;

pub mod memory;

#[derive(Error, Debug)]
pub enum Error {
    #[error("key {0:?} not found")]
    KeyNotFound(String),
    /// Transport failure talking to a remote backend. Kept distinct from
    /// `KeyNotFound` so callers can tell "absent" from "unreachable".
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Multi-reader/multi-writer key/value store.
///
/// Implementations must be safe for concurrent access; callers hold an
/// `Arc<dyn KvStore>` and never lock around it.
#[mockall::automock]
pub trait KvStore: Send + Sync {
    /// One-time backend initialization (schema creation and the like).
    /// Idempotent.
    fn setup(&self) -> Result<(), Error>;

    /// Append `value` to the sequence stored under `key`.
    fn add(&self, key: &str, value: &str) -> Result<(), Error>;

    /// All values under `key` in insertion order, or `KeyNotFound`.
    fn get(&self, key: &str) -> Result<Vec<String>, Error>;

    /// Every distinct key in the store.
    fn get_keys(&self) -> Result<Vec<String>, Error>;

    /// Remove `key` and every value under it. Deleting an absent key is
    /// not an error.
    fn del(&self, key: &str) -> Result<(), Error>;

    /// Release underlying resources.
    fn close(&self) -> Result<(), Error>;
}
