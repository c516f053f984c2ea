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

//! Shared test fixtures: a deterministic signing key and helpers for
//! building signed quote evidence and provisioning records.

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use scheme_tpm_quote::quote::{self, NODE_ID_LEN};

// Any fixed nonzero scalar below the curve order works here.
const TEST_KEY_BYTES: [u8; 32] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
    0x1f, 0x20,
];

/// Deterministic P-256 signing key used across the test suites.
pub fn signing_key() -> SigningKey {
    // The scalar is a compile-time constant known to be valid.
    SigningKey::from_slice(&TEST_KEY_BYTES).unwrap()
}

/// Hex-encoded uncompressed SEC1 public key for [`signing_key`], in the
/// format trust anchors are provisioned in.
pub fn trust_anchor_hex() -> String {
    let point = signing_key().verifying_key().to_encoded_point(false);
    hex::encode(point.as_bytes())
}

/// Complete quote evidence: encoded attestation structure plus a raw
/// 64-byte signature from `key`.
pub fn signed_quote(
    node_id: &[u8; NODE_ID_LEN],
    pcr_selection: &[u8],
    pcr_digest: &[u8],
    key: &SigningKey,
) -> Vec<u8> {
    let message = quote::encode_message(node_id, quote::ALG_SHA256, pcr_selection, pcr_digest);
    let signature: Signature = key.sign(&message);
    let mut evidence = message;
    evidence.extend_from_slice(&signature.to_bytes());
    evidence
}

/// JSON endorsement record holding the expected composite PCR digest.
pub fn endorsement_record(digest_hex: &str) -> String {
    serde_json::json!({ "digest": digest_hex }).to_string()
}
