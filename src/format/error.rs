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

//! src/format/error.rs

use thiserror::Error;

use crate::core::schema::SchemaError;
use crate::core::types::FormatKind;
use crate::core::validator::DiagnosticCode;

/// Malformed input for a known format, or a model a format cannot write
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Document is marked '{found}', expected '{expected}'")]
    MarkerMismatch { expected: FormatKind, found: String },

    #[error("Invalid bit range '{0}': expected \"n\" or \"lo-hi\"")]
    InvalidBitRange(String),

    #[error("Invalid address '{0}': expected a 0x-prefixed hex value")]
    InvalidAddress(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{code}{}: {message}", location.as_deref().map(|l| format!(" at {l}")).unwrap_or_default())]
    Layout {
        code: DiagnosticCode,
        location: Option<String>,
        message: String,
    },

    #[error("Selection references unknown field '{0}'")]
    UnknownSelection(String),

    #[error("{format} cannot represent {what}")]
    Unrepresentable { format: FormatKind, what: String },

    #[error("Mask file{}: {message}", line.map(|l| format!(" line {l}")).unwrap_or_default())]
    MaskFile { line: Option<usize>, message: String },
}
