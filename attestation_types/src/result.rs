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

use serde::{Deserialize, Serialize};

/// Coarse-grained verdict of an appraisal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustTier {
    None,
    Affirming,
    Warning,
    Contraindicated,
}

/// Per-claim-category sub-status for executable measurements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutablesStatus {
    None,
    Affirming,
    Contraindicated,
}

/// Attestation verdict. Starts pessimistic and is only upgraded by a
/// successful appraisal; a failed pipeline step never produces anything
/// weaker than `Contraindicated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResult {
    pub status: TrustTier,
    pub executables: ExecutablesStatus,
}

impl AttestationResult {
    pub fn new() -> Self {
        Self {
            status: TrustTier::Contraindicated,
            executables: ExecutablesStatus::Contraindicated,
        }
    }
}

impl Default for AttestationResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_is_pessimistic() {
        let result = AttestationResult::new();
        assert_eq!(result.status, TrustTier::Contraindicated);
        assert_eq!(result.executables, ExecutablesStatus::Contraindicated);
    }

    #[test]
    fn trust_tier_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TrustTier::Affirming).unwrap(),
            "\"affirming\""
        );
        assert_eq!(
            serde_json::from_str::<TrustTier>("\"contraindicated\"").unwrap(),
            TrustTier::Contraindicated
        );
    }
}
