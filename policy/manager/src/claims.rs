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

use crate::Agent;
use anyhow::Context;
use attestation_types::{AttestationResult, EvidenceContext, ExecutablesStatus, TrustTier};
use serde::Deserialize;

/// Builtin evaluation backend.
///
/// Rules are a JSON document naming claims that must be present in the
/// evidence with exactly the given values:
///
/// ```json
/// { "required": { "hash-algorithm": 11, "pcr-selection": [0, 1, 2] } }
/// ```
///
/// All required claims matching upgrades the verdict to affirming; any
/// missing or differing claim pins it at contraindicated.
pub struct ClaimsAgent;

#[derive(Deserialize)]
struct Rules {
    required: serde_json::Map<String, serde_json::Value>,
}

impl Agent for ClaimsAgent {
    fn backend_name(&self) -> &'static str {
        "claims"
    }

    fn evaluate(
        &self,
        rules: &str,
        evidence: &EvidenceContext,
        _endorsements: &[String],
        result: &AttestationResult,
    ) -> anyhow::Result<AttestationResult> {
        let rules: Rules = serde_json::from_str(rules).context("malformed claims rules")?;

        let matched = rules
            .required
            .iter()
            .all(|(name, expected)| evidence.evidence.get(name) == Some(expected));

        let mut updated = result.clone();
        if matched {
            updated.status = TrustTier::Affirming;
            updated.executables = ExecutablesStatus::Affirming;
        } else {
            updated.status = TrustTier::Contraindicated;
            updated.executables = ExecutablesStatus::Contraindicated;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence_with_claims(claims: serde_json::Value) -> EvidenceContext {
        let serde_json::Value::Object(evidence) = claims else {
            panic!("claims fixture must be a JSON object");
        };
        EvidenceContext {
            format: "tpm-quote".to_string(),
            tenant_id: "0".to_string(),
            trust_anchor_id: "tpm-quote://0/node".to_string(),
            software_id: "tpm-quote://0/node".to_string(),
            evidence,
        }
    }

    #[test]
    fn all_required_claims_match() {
        let evidence = evidence_with_claims(serde_json::json!({
            "hash-algorithm": 11,
            "pcr-selection": [0, 1, 2],
        }));
        let rules = r#"{"required": {"hash-algorithm": 11}}"#;

        let result = ClaimsAgent
            .evaluate(rules, &evidence, &[], &AttestationResult::new())
            .unwrap();
        assert_eq!(result.status, TrustTier::Affirming);
        assert_eq!(result.executables, ExecutablesStatus::Affirming);
    }

    #[test]
    fn differing_claim_stays_contraindicated() {
        let evidence = evidence_with_claims(serde_json::json!({"hash-algorithm": 4}));
        let rules = r#"{"required": {"hash-algorithm": 11}}"#;

        let result = ClaimsAgent
            .evaluate(rules, &evidence, &[], &AttestationResult::new())
            .unwrap();
        assert_eq!(result.status, TrustTier::Contraindicated);
    }

    #[test]
    fn missing_claim_stays_contraindicated() {
        let evidence = evidence_with_claims(serde_json::json!({}));
        let rules = r#"{"required": {"pcr-digest": "aa"}}"#;

        let result = ClaimsAgent
            .evaluate(rules, &evidence, &[], &AttestationResult::new())
            .unwrap();
        assert_eq!(result.status, TrustTier::Contraindicated);
    }

    #[test]
    fn malformed_rules_are_an_error() {
        let evidence = evidence_with_claims(serde_json::json!({}));
        let err = ClaimsAgent
            .evaluate("not json", &evidence, &[], &AttestationResult::new())
            .unwrap_err();
        assert!(err.to_string().contains("malformed claims rules"));
    }

    #[test]
    fn empty_required_set_affirms() {
        let evidence = evidence_with_claims(serde_json::json!({}));
        let rules = r#"{"required": {}}"#;

        let result = ClaimsAgent
            .evaluate(rules, &evidence, &[], &AttestationResult::new())
            .unwrap();
        assert_eq!(result.status, TrustTier::Affirming);
    }
}
