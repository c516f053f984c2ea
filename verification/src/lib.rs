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

//! Evidence verification pipeline.
//!
//! [`Verifier`] drives one token through its scheme: resolve the trust
//! anchor, validate evidence integrity, extract claims, appraise them
//! against endorsements, then apply tenant policy. The pipeline is
//! terminal on first failure and evidence is never trusted before its
//! integrity check passes.

pub mod session;
pub mod state;

use attestation_types::{Appraisal, AttestationToken};
use kvstore::KvStore;
use policy_manager::PolicyManager;
use scheme::SchemeRegistry;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no scheme registered for media type {0:?}")]
    UnsupportedMediaType(String),
    #[error("no trust anchor under {0:?}")]
    NoTrustAnchor(String),
    #[error(transparent)]
    Scheme(#[from] scheme::Error),
    #[error(transparent)]
    Policy(#[from] policy_manager::Error),
    #[error("store unavailable: {0}")]
    Upstream(#[source] kvstore::Error),
}

impl Error {
    /// True for service-side faults (backing stores down or corrupt),
    /// as opposed to verdicts about the evidence itself. Callers map
    /// these to a 5xx-style failure rather than a rejection.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Error::Upstream(_) => true,
            Error::Policy(policy_manager::Error::Store(_)) => true,
            Error::Policy(policy_manager::Error::TooManyPolicies { .. }) => true,
            _ => false,
        }
    }
}

pub struct Verifier {
    schemes: SchemeRegistry,
    policy_manager: PolicyManager,
    trust_anchors: Arc<dyn KvStore>,
    endorsements: Arc<dyn KvStore>,
}

impl Verifier {
    pub fn new(
        schemes: SchemeRegistry,
        policy_manager: PolicyManager,
        trust_anchors: Arc<dyn KvStore>,
        endorsements: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            schemes,
            policy_manager,
            trust_anchors,
            endorsements,
        }
    }

    pub fn is_supported_media_type(&self, media_type: &str) -> bool {
        self.schemes.is_registered_media_type(media_type)
    }

    pub fn supported_media_types(&self) -> Vec<String> {
        self.schemes.registered_media_types()
    }

    /// Run the full pipeline over one attestation token and return the
    /// finished appraisal.
    pub fn process_evidence(&self, token: &AttestationToken) -> Result<Appraisal, Error> {
        let scheme = self
            .schemes
            .lookup_by_media_type(&token.media_type)
            .ok_or_else(|| Error::UnsupportedMediaType(token.media_type.clone()))?;

        let trust_anchor_id = scheme.get_trust_anchor_id(token)?;
        let trust_anchor = self.fetch_trust_anchor(&trust_anchor_id)?;

        // Endorsements are not available yet: the software id comes out
        // of claim extraction, which must not run on unverified data.
        scheme.validate_evidence_integrity(token, &trust_anchor, &[])?;

        let evidence = scheme.extract_claims(token, &trust_anchor_id)?;
        log::debug!(
            "extracted {} claims for {}",
            evidence.evidence.len(),
            evidence.software_id
        );

        let endorsements = self.fetch_endorsements(&evidence.software_id)?;
        let mut appraisal = scheme.appraise_evidence(&evidence, &endorsements)?;

        self.policy_manager.evaluate(&mut appraisal, &endorsements)?;
        Ok(appraisal)
    }

    /// The trust anchor provisioned under `trust_anchor_id`; absence is
    /// a verdict (`NoTrustAnchor`), store failure is infrastructure.
    fn fetch_trust_anchor(&self, trust_anchor_id: &str) -> Result<String, Error> {
        let values = match self.trust_anchors.get(trust_anchor_id) {
            Ok(values) => values,
            Err(kvstore::Error::KeyNotFound(_)) => {
                return Err(Error::NoTrustAnchor(trust_anchor_id.to_string()))
            }
            Err(err) => return Err(Error::Upstream(err)),
        };
        match values.into_iter().next() {
            Some(anchor) => Ok(anchor),
            None => Err(Error::NoTrustAnchor(trust_anchor_id.to_string())),
        }
    }

    /// All endorsement records under `software_id`. Absence is normal:
    /// the appraisal then has nothing to match and the verdict stays
    /// where the scheme left it.
    fn fetch_endorsements(&self, software_id: &str) -> Result<Vec<String>, Error> {
        match self.endorsements.get(software_id) {
            Ok(values) => Ok(values),
            Err(kvstore::Error::KeyNotFound(_)) => Ok(vec![]),
            Err(err) => Err(Error::Upstream(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvstore::MockKvStore;
    use mockall::predicate::eq;

    fn verifier_with_stores(trust_anchors: MockKvStore, endorsements: MockKvStore) -> Verifier {
        let mut registry = policy_manager::AgentRegistry::new();
        registry.register(Arc::new(policy_manager::ClaimsAgent));
        let config = policy_manager::Config {
            backend: "claims".to_string(),
        };
        let policies = MockKvStore::new();
        let policy_manager =
            PolicyManager::new(&config, Arc::new(policies), &registry).unwrap();
        Verifier::new(
            SchemeRegistry::new(),
            policy_manager,
            Arc::new(trust_anchors),
            Arc::new(endorsements),
        )
    }

    #[test]
    fn unknown_media_type_is_rejected() {
        let verifier = verifier_with_stores(MockKvStore::new(), MockKvStore::new());
        let token = AttestationToken {
            tenant_id: "0".to_string(),
            data: vec![],
            media_type: "application/octet-stream".to_string(),
            nonce: vec![],
        };
        let err = verifier.process_evidence(&token).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn missing_trust_anchor_is_a_verdict() {
        let mut trust_anchors = MockKvStore::new();
        trust_anchors
            .expect_get()
            .with(eq("tpm-quote://0/abc"))
            .returning(|key| Err(kvstore::Error::KeyNotFound(key.to_string())));

        let verifier = verifier_with_stores(trust_anchors, MockKvStore::new());
        let err = verifier.fetch_trust_anchor("tpm-quote://0/abc").unwrap_err();
        assert!(matches!(err, Error::NoTrustAnchor(_)));
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn trust_anchor_store_failure_is_infrastructure() {
        let mut trust_anchors = MockKvStore::new();
        trust_anchors
            .expect_get()
            .returning(|_| Err(kvstore::Error::Unavailable("connection refused".to_string())));

        let verifier = verifier_with_stores(trust_anchors, MockKvStore::new());
        let err = verifier.fetch_trust_anchor("tpm-quote://0/abc").unwrap_err();
        assert!(err.is_infrastructure());
    }

    #[test]
    fn missing_endorsements_are_empty() {
        let mut endorsements = MockKvStore::new();
        endorsements
            .expect_get()
            .returning(|key| Err(kvstore::Error::KeyNotFound(key.to_string())));

        let verifier = verifier_with_stores(MockKvStore::new(), endorsements);
        let values = verifier.fetch_endorsements("tpm-quote://0/abc").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn endorsement_store_failure_is_infrastructure() {
        let mut endorsements = MockKvStore::new();
        endorsements
            .expect_get()
            .returning(|_| Err(kvstore::Error::Unavailable("connection refused".to_string())));

        let verifier = verifier_with_stores(MockKvStore::new(), endorsements);
        let err = verifier.fetch_endorsements("tpm-quote://0/abc").unwrap_err();
        assert!(err.is_infrastructure());
    }
}
