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

//! Wire codec for the quote evidence format.
//!
//! A quote is a big-endian attestation structure followed by a raw
//! 64-byte P-256 signature over everything that precedes it:
//!
//! ```text
//! u32  magic (0xff544347)
//! u16  attestation type (0x8018)
//! [16] node id
//! u16  hash algorithm
//! u8   PCR count, then one u8 index per selected PCR
//! u16  digest length, then the composite PCR digest
//! [64] signature (r || s)
//! ```

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use scheme::Error;

pub const TPM_GENERATED_MAGIC: u32 = 0xff54_4347;
pub const TAG_ATTEST_QUOTE: u16 = 0x8018;
pub const ALG_SHA256: u16 = 0x000b;
pub const NODE_ID_LEN: usize = 16;
pub const SIGNATURE_LEN: usize = 64;

/// Decoded quote. `message` keeps the exact signed bytes so signature
/// verification does not depend on re-encoding.
#[derive(Clone, Debug)]
pub struct Quote {
    pub node_id: [u8; NODE_ID_LEN],
    pub hash_algorithm: u16,
    pub pcr_selection: Vec<u8>,
    pub pcr_digest: Vec<u8>,
    pub signature: [u8; SIGNATURE_LEN],
    message: Vec<u8>,
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| Error::Decode("truncated quote structure".to_string()))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, Error> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, Error> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn finish(self) -> Result<(), Error> {
        if self.offset != self.data.len() {
            return Err(Error::Decode(format!(
                "{} trailing bytes after quote structure",
                self.data.len() - self.offset
            )));
        }
        Ok(())
    }
}

impl Quote {
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        if data.len() < SIGNATURE_LEN {
            return Err(Error::Decode("quote shorter than its signature".to_string()));
        }
        let (message, signature_bytes) = data.split_at(data.len() - SIGNATURE_LEN);
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(signature_bytes);

        let mut reader = Reader::new(message);

        let magic = reader.u32()?;
        if magic != TPM_GENERATED_MAGIC {
            return Err(Error::Decode(format!("bad magic {magic:#010x}")));
        }
        let attestation_type = reader.u16()?;
        if attestation_type != TAG_ATTEST_QUOTE {
            return Err(Error::Decode(format!(
                "not a quote attestation: type {attestation_type:#06x}"
            )));
        }

        let mut node_id = [0u8; NODE_ID_LEN];
        node_id.copy_from_slice(reader.take(NODE_ID_LEN)?);

        let hash_algorithm = reader.u16()?;

        let pcr_count = reader.u8()? as usize;
        let pcr_selection = reader.take(pcr_count)?.to_vec();

        let digest_len = reader.u16()? as usize;
        let pcr_digest = reader.take(digest_len)?.to_vec();

        reader.finish()?;

        Ok(Self {
            node_id,
            hash_algorithm,
            pcr_selection,
            pcr_digest,
            signature,
            message: message.to_vec(),
        })
    }

    /// Check the raw `r || s` signature over the attestation structure.
    pub fn verify_signature(&self, key: &VerifyingKey) -> Result<(), Error> {
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| Error::Integrity(format!("malformed signature: {e}")))?;
        key.verify(&self.message, &signature)
            .map_err(|e| Error::Integrity(format!("signature verification failed: {e}")))
    }
}

/// Encode the signable attestation structure. The caller appends the
/// 64-byte signature to form complete quote evidence.
pub fn encode_message(
    node_id: &[u8; NODE_ID_LEN],
    hash_algorithm: u16,
    pcr_selection: &[u8],
    pcr_digest: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        4 + 2 + NODE_ID_LEN + 2 + 1 + pcr_selection.len() + 2 + pcr_digest.len(),
    );
    out.extend_from_slice(&TPM_GENERATED_MAGIC.to_be_bytes());
    out.extend_from_slice(&TAG_ATTEST_QUOTE.to_be_bytes());
    out.extend_from_slice(node_id);
    out.extend_from_slice(&hash_algorithm.to_be_bytes());
    out.push(pcr_selection.len() as u8);
    out.extend_from_slice(pcr_selection);
    out.extend_from_slice(&(pcr_digest.len() as u16).to_be_bytes());
    out.extend_from_slice(pcr_digest);
    out
}
