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

use crate::result::AttestationResult;
use serde::{Deserialize, Serialize};

/// Canonical claim set: claim name to JSON value.
pub type ClaimMap = serde_json::Map<String, serde_json::Value>;

/// Canonical claims extracted from one attestation token, plus the
/// identifiers the appraisal path keys its lookups on. Produced by a
/// scheme's claim-extraction step, after evidence integrity has been
/// verified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceContext {
    /// Scheme identifier of the evidence format.
    pub format: String,
    pub tenant_id: String,
    /// Lookup key the trust anchor was resolved under.
    pub trust_anchor_id: String,
    /// Lookup key for reference endorsements, synthesized with the same
    /// URI shape as `trust_anchor_id` but scoped to software components.
    pub software_id: String,
    pub evidence: ClaimMap,
}

/// Evidence context paired with the verdict being built for it. Owned by
/// the call that constructs it; only `result` changes after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Appraisal {
    pub evidence: EvidenceContext,
    pub result: AttestationResult,
}

impl Appraisal {
    /// Starts with the pessimistic default result.
    pub fn new(evidence: EvidenceContext) -> Self {
        Self {
            evidence,
            result: AttestationResult::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TrustTier;

    #[test]
    fn fresh_appraisal_is_contraindicated() {
        let evidence = EvidenceContext {
            format: "tpm-quote".to_string(),
            tenant_id: "0".to_string(),
            trust_anchor_id: "tpm-quote://0/abc".to_string(),
            software_id: "tpm-quote://0/abc".to_string(),
            evidence: ClaimMap::new(),
        };
        let appraisal = Appraisal::new(evidence);
        assert_eq!(appraisal.result.status, TrustTier::Contraindicated);
    }
}
