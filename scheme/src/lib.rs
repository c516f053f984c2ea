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

//! Pluggable, format-specific evidence verifiers.
//!
//! A [`Scheme`] turns one attestation wire format into the canonical
//! claim model: it derives trust-anchor and endorsement lookup keys,
//! verifies evidence integrity against a trust anchor, extracts claims,
//! and performs the scheme-local appraisal. Schemes are registered in a
//! [`SchemeRegistry`] at startup and addressed by declared media type.

use attestation_types::{Appraisal, AttestationToken, EvidenceContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed evidence bytes.
    #[error("could not decode evidence: {0}")]
    Decode(String),
    /// Evidence failed cryptographic verification, or the trust anchor
    /// material could not be parsed. The sole gate before claims are
    /// trusted.
    #[error("could not verify evidence integrity: {0}")]
    Integrity(String),
    #[error("wrong evidence format: expected {expected:?}, found {found:?}")]
    WrongFormat { expected: String, found: String },
    #[error("missing mandatory attribute {0:?}")]
    MissingAttribute(String),
    /// A claim the appraisal depends on is absent or has the wrong type.
    #[error("bad evidence claim {name:?}: {reason}")]
    Claim { name: String, reason: String },
    #[error("malformed endorsement record: {0}")]
    Endorsement(String),
    #[error("media type {0:?} already registered")]
    DuplicateMediaType(String),
}

/// Opaque endorsement or trust-anchor reference owned by the external
/// endorsement store. Schemes only read its attribute set to synthesize
/// lookup keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub scheme: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Format-specific evidence verifier and appraiser.
///
/// The verification pipeline is terminal on first failure: decode,
/// resolve trust anchor, validate integrity, extract claims, appraise.
/// `extract_claims` must only be called after
/// `validate_evidence_integrity` succeeded.
pub trait Scheme: Send + Sync {
    /// Scheme identifier; also the URI scheme of its lookup keys and
    /// the `format` field of the evidence contexts it produces.
    fn name(&self) -> &'static str;

    /// Media types this scheme is addressed by.
    fn supported_media_types(&self) -> &'static [&'static str];

    /// Lookup keys for provisioned trust-anchor material.
    fn synth_keys_from_trust_anchor(
        &self,
        tenant_id: &str,
        trust_anchor: &Endorsement,
    ) -> Result<Vec<String>, Error>;

    /// Lookup keys for provisioned software-component endorsements.
    /// Must use the same URI shape as the trust-anchor keys so external
    /// stores keep a single key space per scheme.
    fn synth_keys_from_sw_component(
        &self,
        tenant_id: &str,
        sw_component: &Endorsement,
    ) -> Result<Vec<String>, Error>;

    /// Derive the trust-anchor lookup key from identifying fields of
    /// the (still unverified) evidence.
    fn get_trust_anchor_id(&self, token: &AttestationToken) -> Result<String, Error>;

    /// Project format-specific fields into the canonical claim map.
    fn extract_claims(
        &self,
        token: &AttestationToken,
        trust_anchor_id: &str,
    ) -> Result<EvidenceContext, Error>;

    /// Verify the evidence signature against the trust-anchor material.
    fn validate_evidence_integrity(
        &self,
        token: &AttestationToken,
        trust_anchor: &str,
        endorsements: &[String],
    ) -> Result<(), Error>;

    /// Compare extracted claims against endorsement records and set the
    /// trust tier; upgrades only on a positive, explicit match.
    fn appraise_evidence(
        &self,
        evidence: &EvidenceContext,
        endorsements: &[String],
    ) -> Result<Appraisal, Error>;
}

/// Canonical lookup key `format://tenant/segment`, shared by the
/// trust-anchor and software-component key spaces.
pub fn lookup_key(format: &str, tenant_id: &str, segment: &str) -> String {
    format!("{format}://{tenant_id}/{segment}")
}

/// Extract a mandatory single-segment path component from an attribute
/// set. Fails with `MissingAttribute` if the attribute is absent, not a
/// string, empty, or not a single path segment.
pub fn mandatory_path_segment(
    attributes: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<String, Error> {
    let value = attributes
        .get(name)
        .ok_or_else(|| Error::MissingAttribute(name.to_string()))?;
    match value.as_str() {
        Some(segment) if !segment.is_empty() && !segment.contains('/') => Ok(segment.to_string()),
        _ => Err(Error::MissingAttribute(name.to_string())),
    }
}

/// Media-type keyed registry of statically loaded schemes. Built at
/// startup and handed to the verifier; no ambient global state.
#[derive(Default)]
pub struct SchemeRegistry {
    by_media_type: BTreeMap<String, Arc<dyn Scheme>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scheme under every media type it declares. Fails if
    /// any of them is already claimed.
    pub fn register(&mut self, scheme: Arc<dyn Scheme>) -> Result<(), Error> {
        for media_type in scheme.supported_media_types() {
            if self.by_media_type.contains_key(*media_type) {
                return Err(Error::DuplicateMediaType(media_type.to_string()));
            }
        }
        for media_type in scheme.supported_media_types() {
            self.by_media_type
                .insert(media_type.to_string(), Arc::clone(&scheme));
        }
        Ok(())
    }

    pub fn lookup_by_media_type(&self, media_type: &str) -> Option<Arc<dyn Scheme>> {
        self.by_media_type.get(media_type).cloned()
    }

    pub fn is_registered_media_type(&self, media_type: &str) -> bool {
        self.by_media_type.contains_key(media_type)
    }

    pub fn registered_media_types(&self) -> Vec<String> {
        self.by_media_type.keys().cloned().collect()
    }
}
