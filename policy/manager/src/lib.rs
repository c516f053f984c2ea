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

//! Tenant policy appraisal.
//!
//! The policy manager resolves the single active policy for an evidence
//! context and hands its rules to the configured evaluation backend
//! (agent). Policy lookup keys have the shape `backend://tenant/format`
//! and are deliberately decoupled from the policy store's own id
//! layout: the manager formats them and never parses them back.

pub use claims::ClaimsAgent;

use attestation_types::{Appraisal, AttestationResult, EvidenceContext};
use kvstore::KvStore;
use policy_store::{Policy, PolicyId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub mod claims;

#[derive(Error, Debug)]
pub enum Error {
    #[error("backend {0:?} is not supported")]
    UnsupportedBackend(String),
    #[error("no policy found for {0:?}")]
    NoPolicy(String),
    /// Consistency violation: the appraisal path requires at most one
    /// policy entry per lookup key, and never resolves extras silently.
    #[error("found {count} policy entries for id {key:?}; must be at most 1")]
    TooManyPolicies { count: usize, key: String },
    #[error("corrupt policy record under {key:?}: {reason}")]
    CorruptRecord { key: String, reason: String },
    #[error("could not evaluate policy: {0}")]
    Evaluation(anyhow::Error),
    #[error(transparent)]
    Store(#[from] kvstore::Error),
}

/// Pluggable policy-evaluation backend.
///
/// Exactly one agent is active per deployment, selected at construction
/// time. The agent never mutates the caller's state: it returns a fresh
/// result the manager folds into the appraisal.
#[mockall::automock]
pub trait Agent: Send + Sync {
    /// Stable name the agent registers under; also the scope segment of
    /// the policy lookup keys it is consulted for.
    fn backend_name(&self) -> &'static str;

    /// Evaluate `rules` against the evidence claims and endorsements,
    /// starting from `result`, and return the updated result.
    fn evaluate(
        &self,
        rules: &str,
        evidence: &EvidenceContext,
        endorsements: &[String],
        result: &AttestationResult,
    ) -> anyhow::Result<AttestationResult>;
}

/// Explicit registry of evaluation backends, built at startup and
/// passed to [`PolicyManager::new`]. No ambient global state.
#[derive(Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.backend_name().to_string(), agent);
    }

    pub fn lookup(&self, backend_name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(backend_name).cloned()
    }
}

/// Configuration directive naming the active evaluation backend.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub backend: String,
}

pub struct PolicyManager {
    store: Arc<dyn KvStore>,
    agent: Arc<dyn Agent>,
}

impl std::fmt::Debug for PolicyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyManager").finish_non_exhaustive()
    }
}

impl PolicyManager {
    /// Fails with `UnsupportedBackend` if the configured backend is not
    /// in the registry.
    pub fn new(
        config: &Config,
        store: Arc<dyn KvStore>,
        registry: &AgentRegistry,
    ) -> Result<Self, Error> {
        let agent = registry
            .lookup(&config.backend)
            .ok_or_else(|| Error::UnsupportedBackend(config.backend.clone()))?;
        Ok(Self { store, agent })
    }

    fn policy_key(&self, evidence: &EvidenceContext) -> String {
        format!(
            "{}://{}/{}",
            self.agent.backend_name(),
            evidence.tenant_id,
            evidence.format
        )
    }

    /// The single active policy for this evidence context, `NoPolicy`
    /// if none is stored, or `TooManyPolicies` if the key resolves to
    /// more than one entry.
    fn get_policy(&self, evidence: &EvidenceContext) -> Result<Policy, Error> {
        let key = self.policy_key(evidence);
        let values = match self.store.get(&key) {
            Ok(values) => values,
            Err(kvstore::Error::KeyNotFound(_)) => return Err(Error::NoPolicy(key)),
            Err(err) => return Err(err.into()),
        };

        match values.as_slice() {
            [] => Err(Error::NoPolicy(key)),
            [value] => {
                let mut policy: Policy =
                    serde_json::from_str(value).map_err(|err| Error::CorruptRecord {
                        key: key.clone(),
                        reason: err.to_string(),
                    })?;
                policy.id = PolicyId::new(
                    self.agent.backend_name(),
                    &evidence.tenant_id,
                    &evidence.format,
                )
                .map_err(|err| Error::CorruptRecord {
                    key: key.clone(),
                    reason: err.to_string(),
                })?;
                Ok(policy)
            }
            values => {
                log::error!(
                    "policy store consistency violation: {} entries under {key:?}",
                    values.len()
                );
                Err(Error::TooManyPolicies {
                    count: values.len(),
                    key,
                })
            }
        }
    }

    /// Appraise the evidence against tenant policy, if any.
    ///
    /// Absence of a policy is not a failure: the appraisal keeps the
    /// verdict the scheme already produced. Backend errors are wrapped
    /// and always propagated; the prior result is not guaranteed
    /// preserved if the backend fails partway.
    pub fn evaluate(&self, appraisal: &mut Appraisal, endorsements: &[String]) -> Result<(), Error> {
        let policy = match self.get_policy(&appraisal.evidence) {
            Ok(policy) => policy,
            Err(Error::NoPolicy(key)) => {
                log::debug!("no policy under {key:?}; keeping scheme verdict");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let result = self
            .agent
            .evaluate(
                &policy.rules,
                &appraisal.evidence,
                endorsements,
                &appraisal.result,
            )
            .map_err(Error::Evaluation)?;
        appraisal.result = result;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestation_types::{ClaimMap, TrustTier};
    use kvstore::MockKvStore;
    use mockall::predicate::eq;

    const POLICY_KEY: &str = "opa://0/tpm-quote";

    fn evidence_context() -> EvidenceContext {
        EvidenceContext {
            format: "tpm-quote".to_string(),
            tenant_id: "0".to_string(),
            trust_anchor_id: "tpm-quote://0/7df7714e".to_string(),
            software_id: "tpm-quote://0/7df7714e".to_string(),
            evidence: ClaimMap::new(),
        }
    }

    fn opa_agent() -> MockAgent {
        let mut agent = MockAgent::new();
        agent.expect_backend_name().return_const("opa");
        agent
    }

    fn manager(store: MockKvStore, agent: MockAgent) -> PolicyManager {
        PolicyManager {
            store: Arc::new(store),
            agent: Arc::new(agent),
        }
    }

    fn policy_record(rules: &str) -> String {
        serde_json::to_string(&Policy {
            id: PolicyId::default(),
            rules: rules.to_string(),
            version: 1,
        })
        .unwrap()
    }

    #[test]
    fn get_policy_not_found() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|key| Err(kvstore::Error::KeyNotFound(key.to_string())));

        let pm = manager(store, opa_agent());
        match pm.get_policy(&evidence_context()) {
            Err(Error::NoPolicy(key)) => assert_eq!(key, POLICY_KEY),
            other => panic!("expected NoPolicy, got {other:?}"),
        }
    }

    #[test]
    fn get_policy_multiple_found() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Ok(vec![policy_record("one"), policy_record("two")]));

        let pm = manager(store, opa_agent());
        let err = pm.get_policy(&evidence_context()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "found 2 policy entries for id \"opa://0/tpm-quote\"; must be at most 1"
        );
    }

    #[test]
    fn get_policy_single_match() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Ok(vec![policy_record("real rules")]));

        let pm = manager(store, opa_agent());
        let policy = pm.get_policy(&evidence_context()).unwrap();
        assert_eq!(policy.rules, "real rules");
        assert_eq!(policy.id, PolicyId::new("opa", "0", "tpm-quote").unwrap());
    }

    #[test]
    fn get_policy_corrupt_record() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Ok(vec!["not json".to_string()]));

        let pm = manager(store, opa_agent());
        assert!(matches!(
            pm.get_policy(&evidence_context()),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn new_with_registered_backend() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(opa_agent()));

        let config = Config {
            backend: "opa".to_string(),
        };
        assert!(PolicyManager::new(&config, Arc::new(MockKvStore::new()), &registry).is_ok());
    }

    #[test]
    fn new_with_unknown_backend() {
        let registry = AgentRegistry::new();
        let config = Config {
            backend: "nope".to_string(),
        };
        let err = PolicyManager::new(&config, Arc::new(MockKvStore::new()), &registry).unwrap_err();
        assert_eq!(err.to_string(), "backend \"nope\" is not supported");
    }

    #[test]
    fn config_reads_backend_directive() {
        let config: Config = serde_json::from_str(r#"{"backend": "opa"}"#).unwrap();
        assert_eq!(config.backend, "opa");
    }

    #[test]
    fn evaluate_applies_backend_result() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Ok(vec![policy_record("real rules")]));

        let mut agent = opa_agent();
        agent
            .expect_evaluate()
            .withf(|rules, _, endorsements, _| {
                rules == "real rules" && endorsements == ["endorsement"]
            })
            .returning(|_, _, _, result| {
                let mut updated = result.clone();
                updated.status = TrustTier::Affirming;
                Ok(updated)
            });

        let pm = manager(store, agent);
        let mut appraisal = Appraisal::new(evidence_context());
        pm.evaluate(&mut appraisal, &["endorsement".to_string()])
            .unwrap();
        assert_eq!(appraisal.result.status, TrustTier::Affirming);
    }

    #[test]
    fn evaluate_skips_backend_when_no_policy() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|key| Err(kvstore::Error::KeyNotFound(key.to_string())));

        let mut agent = opa_agent();
        agent.expect_evaluate().never();

        let pm = manager(store, agent);
        let mut appraisal = Appraisal::new(evidence_context());
        pm.evaluate(&mut appraisal, &[]).unwrap();
        assert_eq!(appraisal.result.status, TrustTier::Contraindicated);
    }

    #[test]
    fn evaluate_wraps_backend_error() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Ok(vec![policy_record("real rules")]));

        let mut agent = opa_agent();
        agent
            .expect_evaluate()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("policy returned bad update")));

        let pm = manager(store, agent);
        let mut appraisal = Appraisal::new(evidence_context());
        let err = pm.evaluate(&mut appraisal, &[]).unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
        assert_eq!(
            err.to_string(),
            "could not evaluate policy: policy returned bad update"
        );
    }

    #[test]
    fn evaluate_propagates_store_failure() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .with(eq(POLICY_KEY))
            .returning(|_| Err(kvstore::Error::Unavailable("connection refused".to_string())));

        let pm = manager(store, opa_agent());
        let mut appraisal = Appraisal::new(evidence_context());
        assert!(matches!(
            pm.evaluate(&mut appraisal, &[]),
            Err(Error::Store(kvstore::Error::Unavailable(_)))
        ));
    }
}
