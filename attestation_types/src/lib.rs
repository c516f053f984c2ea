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

//! Canonical data model shared by every Verdict component.
//!
//! The crate carries no behavior beyond construction defaults: the wire
//! envelope (`AttestationToken`), the canonical claim set extracted from
//! it (`EvidenceContext`), and the verdict produced by appraisal
//! (`Appraisal`, `AttestationResult`, `TrustTier`).

pub use evidence::{Appraisal, ClaimMap, EvidenceContext};
pub use result::{AttestationResult, ExecutablesStatus, TrustTier};
pub use token::AttestationToken;

pub mod evidence;
pub mod result;
pub mod token;
