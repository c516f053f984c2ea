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

//! Durable, versioned store of policy documents.
//!
//! Policies are immutable once written: an update appends a new record
//! with the next version number rather than editing in place, so every
//! prior version stays readable. Records are JSON values in a generic
//! [`kvstore::KvStore`], one key per policy id, one value per version.

pub use policy_id::PolicyId;

use kvstore::KvStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod policy_id;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no policy found for {0:?}")]
    NoPolicy(String),
    #[error("policy with id {0:?} already exists")]
    AlreadyExists(String),
    #[error("bad key in store: {0:?}")]
    MalformedKey(String),
    #[error("corrupt policy record under {key:?}: {reason}")]
    CorruptRecord { key: String, reason: String },
    #[error(transparent)]
    Store(#[from] kvstore::Error),
}

/// One immutable version of a policy document. Versions start at 1 and
/// increase by 1 with every update; "latest" is the maximum version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(skip)]
    pub id: PolicyId,
    /// Opaque rule text, interpreted only by the evaluation backend.
    pub rules: String,
    pub version: u32,
}

/// Versioned policy store over a generic key/value backend.
pub struct Store {
    kv: Arc<dyn KvStore>,
    // Serializes read-latest + append in `update` so two in-process
    // writers cannot both observe the same latest version.
    update_lock: Mutex<()>,
}

impl Store {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            update_lock: Mutex::new(()),
        }
    }

    /// One-time setup of the underlying store. Idempotent.
    pub fn setup(&self) -> Result<(), Error> {
        Ok(self.kv.setup()?)
    }

    /// Add a policy with the given id and rules. Fails if any version
    /// already exists for the id.
    pub fn add(&self, id: &PolicyId, rules: &str) -> Result<(), Error> {
        match self.get(id) {
            Ok(_) => Err(Error::AlreadyExists(id.store_key())),
            Err(Error::NoPolicy(_)) => self.update(id, rules),
            Err(err) => Err(err),
        }
    }

    /// Write `rules` as the next version of the policy with the given
    /// id, creating version 1 if none exists.
    ///
    /// The read-latest + append sequence is made atomic here with an
    /// in-process lock. A distributed `KvStore` backend shared by
    /// several writer processes still needs its own compare-and-swap or
    /// per-id coordination to rule out duplicate versions.
    pub fn update(&self, id: &PolicyId, rules: &str) -> Result<(), Error> {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|_| kvstore::Error::Backend("update lock poisoned".to_string()))?;

        let old_version = match self.get_latest(id) {
            Ok(policy) => policy.version,
            Err(Error::NoPolicy(_)) => 0,
            Err(err) => return Err(err),
        };

        let record = Policy {
            id: id.clone(),
            rules: rules.to_string(),
            version: old_version + 1,
        };
        let value = serde_json::to_string(&record).map_err(|err| Error::CorruptRecord {
            key: id.store_key(),
            reason: err.to_string(),
        })?;

        log::debug!("writing policy {} version {}", id, record.version);
        Ok(self.kv.add(&id.store_key(), &value)?)
    }

    /// All versions of the policy with the given id, in ascending
    /// version order. Fails with `NoPolicy` if the id is absent.
    pub fn get(&self, id: &PolicyId) -> Result<Vec<Policy>, Error> {
        let key = id.store_key();
        let values = match self.kv.get(&key) {
            Ok(values) => values,
            Err(kvstore::Error::KeyNotFound(_)) => return Err(Error::NoPolicy(key)),
            Err(err) => return Err(err.into()),
        };

        let mut policies = Vec::with_capacity(values.len());
        for value in &values {
            let mut policy: Policy =
                serde_json::from_str(value).map_err(|err| Error::CorruptRecord {
                    key: key.clone(),
                    reason: err.to_string(),
                })?;
            policy.id = id.clone();
            policies.push(policy);
        }

        if policies.is_empty() {
            return Err(Error::NoPolicy(key));
        }
        policies.sort_by_key(|policy| policy.version);
        Ok(policies)
    }

    /// The maximum-version record for the given id.
    pub fn get_latest(&self, id: &PolicyId) -> Result<Policy, Error> {
        let policies = self.get(id)?;
        policies
            .into_iter()
            .max_by_key(|policy| policy.version)
            .ok_or_else(|| Error::NoPolicy(id.store_key()))
    }

    /// Ids of all policies currently in the store.
    pub fn get_policy_ids(&self) -> Result<Vec<PolicyId>, Error> {
        self.kv
            .get_keys()?
            .iter()
            .map(|key| PolicyId::from_store_key(key))
            .collect()
    }

    /// Latest version of every policy, one entry per distinct id.
    pub fn list(&self) -> Result<Vec<Policy>, Error> {
        let mut policies = Vec::new();
        for id in self.get_policy_ids()? {
            policies.push(self.get_latest(&id)?);
        }
        Ok(policies)
    }

    /// Every policy record in the store, all ids, all versions.
    pub fn list_all_versions(&self) -> Result<Vec<Policy>, Error> {
        let mut policies = Vec::new();
        for id in self.get_policy_ids()? {
            policies.extend(self.get(&id)?);
        }
        Ok(policies)
    }

    /// Remove all versions associated with the given id.
    pub fn del(&self, id: &PolicyId) -> Result<(), Error> {
        Ok(self.kv.del(&id.store_key())?)
    }

    /// Close the connection to the underlying store.
    pub fn close(&self) -> Result<(), Error> {
        Ok(self.kv.close()?)
    }
}
