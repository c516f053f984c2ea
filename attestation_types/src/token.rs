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

/// Wire-level evidence envelope, constructed once at ingress and passed
/// by reference into scheme operations. `data` is opaque to everything
/// except the scheme addressed by `media_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationToken {
    pub tenant_id: String,
    pub data: Vec<u8>,
    pub media_type: String,
    pub nonce: Vec<u8>,
}
