// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/error.rs
//!
//! Engine error taxonomy
//!
//! Validation findings are never errors; they travel as a
//! [`DiagnosticsReport`]. The variants here are the conditions that abort
//! an operation outright.

use thiserror::Error;

use crate::core::validator::DiagnosticsReport;
use crate::format::ParseError;

/// Errors returned by the engine and the facade
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input was recognised as a known format but is malformed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Input carries no known `format:` marker
    #[error("Unsupported format: {}", marker.as_deref().map_or_else(|| "missing 'format' marker".to_string(), |m| format!("unknown marker '{m}'")))]
    UnsupportedFormat { marker: Option<String> },

    /// An identifier does not exist in the loaded model (stale caller state)
    #[error("Unknown identifier '{0}'")]
    NotFound(String),

    /// Export refused while Error-level diagnostics are outstanding
    #[error("Export blocked: {errors} error diagnostic(s) unresolved")]
    ExportBlocked {
        errors: usize,
        report: DiagnosticsReport,
    },
}

impl EngineError {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound(id.into())
    }
}
