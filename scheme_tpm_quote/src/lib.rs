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

//! Evidence scheme for signed platform quotes.
//!
//! Trust anchors are hex-encoded SEC1 P-256 public keys, keyed by the
//! node id carried in the quote. Endorsements are JSON records holding
//! the expected composite PCR digest for a node.

pub mod quote;

use attestation_types::{Appraisal, AttestationToken, EvidenceContext, ExecutablesStatus, TrustTier};
use p256::ecdsa::VerifyingKey;
use scheme::{lookup_key, mandatory_path_segment, Endorsement, Error, Scheme};
use serde::{Deserialize, Serialize};

use quote::Quote;

pub const SCHEME_NAME: &str = "tpm-quote";
pub const MEDIA_TYPE: &str = "application/vnd.verdict.tpm-quote";
/// Attribute naming the node a trust anchor or endorsement belongs to.
pub const NODE_ID_ATTRIBUTE: &str = "tpm-quote.node-id";

const SUPPORTED_MEDIA_TYPES: &[&str] = &[MEDIA_TYPE];

/// Provisioned reference value for one node.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndorsementRecord {
    /// Hex-encoded composite PCR digest.
    pub digest: String,
}

pub struct TpmQuoteScheme;

fn parse_trust_anchor(trust_anchor: &str) -> Result<VerifyingKey, Error> {
    let raw = hex::decode(trust_anchor.trim())
        .map_err(|e| Error::Integrity(format!("trust anchor is not valid hex: {e}")))?;
    VerifyingKey::from_sec1_bytes(&raw)
        .map_err(|e| Error::Integrity(format!("trust anchor is not a valid P-256 key: {e}")))
}

fn node_key(tenant_id: &str, node_id: &str) -> String {
    lookup_key(SCHEME_NAME, tenant_id, node_id)
}

impl Scheme for TpmQuoteScheme {
    fn name(&self) -> &'static str {
        SCHEME_NAME
    }

    fn supported_media_types(&self) -> &'static [&'static str] {
        SUPPORTED_MEDIA_TYPES
    }

    fn synth_keys_from_trust_anchor(
        &self,
        tenant_id: &str,
        trust_anchor: &Endorsement,
    ) -> Result<Vec<String>, Error> {
        let node_id = mandatory_path_segment(&trust_anchor.attributes, NODE_ID_ATTRIBUTE)?;
        Ok(vec![node_key(tenant_id, &node_id)])
    }

    fn synth_keys_from_sw_component(
        &self,
        tenant_id: &str,
        sw_component: &Endorsement,
    ) -> Result<Vec<String>, Error> {
        let node_id = mandatory_path_segment(&sw_component.attributes, NODE_ID_ATTRIBUTE)?;
        Ok(vec![node_key(tenant_id, &node_id)])
    }

    fn get_trust_anchor_id(&self, token: &AttestationToken) -> Result<String, Error> {
        if token.media_type != MEDIA_TYPE {
            return Err(Error::WrongFormat {
                expected: MEDIA_TYPE.to_string(),
                found: token.media_type.clone(),
            });
        }
        let quote = Quote::decode(&token.data)?;
        Ok(node_key(&token.tenant_id, &hex::encode(quote.node_id)))
    }

    fn extract_claims(
        &self,
        token: &AttestationToken,
        trust_anchor_id: &str,
    ) -> Result<EvidenceContext, Error> {
        let quote = Quote::decode(&token.data)?;

        let mut evidence = serde_json::Map::new();
        evidence.insert(
            "pcr-selection".to_string(),
            serde_json::Value::from(quote.pcr_selection.clone()),
        );
        evidence.insert(
            "hash-algorithm".to_string(),
            serde_json::Value::from(quote.hash_algorithm),
        );
        evidence.insert(
            "pcr-digest".to_string(),
            serde_json::Value::from(hex::encode(&quote.pcr_digest)),
        );

        Ok(EvidenceContext {
            format: SCHEME_NAME.to_string(),
            tenant_id: token.tenant_id.clone(),
            trust_anchor_id: trust_anchor_id.to_string(),
            // Reference values share the node's key space.
            software_id: node_key(&token.tenant_id, &hex::encode(quote.node_id)),
            evidence,
        })
    }

    fn validate_evidence_integrity(
        &self,
        token: &AttestationToken,
        trust_anchor: &str,
        _endorsements: &[String],
    ) -> Result<(), Error> {
        let quote = Quote::decode(&token.data)?;
        let key = parse_trust_anchor(trust_anchor)?;
        quote.verify_signature(&key)
    }

    fn appraise_evidence(
        &self,
        evidence: &EvidenceContext,
        endorsements: &[String],
    ) -> Result<Appraisal, Error> {
        let mut appraisal = Appraisal::new(evidence.clone());

        let digest = evidence
            .evidence
            .get("pcr-digest")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Claim {
                name: "pcr-digest".to_string(),
                reason: "missing or not a string".to_string(),
            })?;

        for endorsement in endorsements {
            let record: EndorsementRecord = serde_json::from_str(endorsement)
                .map_err(|e| Error::Endorsement(e.to_string()))?;
            if record.digest.eq_ignore_ascii_case(digest) {
                appraisal.result.status = TrustTier::Affirming;
                appraisal.result.executables = ExecutablesStatus::Affirming;
                return Ok(appraisal);
            }
        }

        log::debug!(
            "no endorsement matched digest for {}",
            evidence.software_id
        );
        Ok(appraisal)
    }
}
