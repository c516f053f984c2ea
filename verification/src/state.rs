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

//! Service discovery document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Initializing,
    Ready,
    Down,
}

/// Snapshot of the service advertised to clients before they submit
/// evidence: version, readiness, and the evidence media types each API
/// surface accepts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceState {
    pub server_version: String,
    pub status: ServiceStatus,
    pub supported_media_types: BTreeMap<String, Vec<String>>,
}

impl ServiceState {
    pub fn ready(verification_media_types: Vec<String>) -> Self {
        let mut supported_media_types = BTreeMap::new();
        supported_media_types.insert("challenge-response/v1".to_string(), verification_media_types);
        Self {
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            status: ServiceStatus::Ready,
            supported_media_types,
        }
    }
}
