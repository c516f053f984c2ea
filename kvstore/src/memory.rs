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

use crate::{Error, KvStore};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory backend. Everything lives behind one mutex, which makes it
/// safe for concurrent callers and good enough for tests and
/// single-process deployments.
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, Vec<String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<String>>>, Error> {
        self.entries
            .lock()
            .map_err(|_| Error::Backend("memory store lock poisoned".to_string()))
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    fn setup(&self) -> Result<(), Error> {
        Ok(())
    }

    fn add(&self, key: &str, value: &str) -> Result<(), Error> {
        self.lock()?
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<String>, Error> {
        self.lock()?
            .get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    fn get_keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn del(&self, key: &str) -> Result<(), Error> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}
