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

//! Verification session resource returned to relying parties.

use attestation_types::AttestationResult;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_MEDIA_TYPE: &str = "application/vnd.verdict.verification-session+json";

/// How long a finished session stays retrievable.
const SESSION_TTL_MINUTES: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Success,
    Failed,
}

/// Finished verification exchange. Serialized as the session resource
/// body; `failure_reason` is present only on failed sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerificationSession {
    pub status: SessionStatus,
    /// RFC 3339 instant after which the session may be garbage-collected.
    pub expiry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AttestationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

fn expiry_from(now: DateTime<Utc>) -> String {
    (now + Duration::minutes(SESSION_TTL_MINUTES)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl VerificationSession {
    pub fn success(result: AttestationResult) -> Self {
        Self {
            status: SessionStatus::Success,
            expiry: expiry_from(Utc::now()),
            result: Some(result),
            failure_reason: None,
        }
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            status: SessionStatus::Failed,
            expiry: expiry_from(Utc::now()),
            result: None,
            failure_reason: Some(reason.to_string()),
        }
    }
}
