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

//! src/format/mod.rs
//!
//! Definition document formats
//!
//! Every schema generation is one [`FormatStrategy`] implementation. The
//! [`FormatRegistry`] reads the top-level `format:` marker of a document
//! and hands it to the strategy that claims that marker, so adding a
//! generation means registering a strategy, not editing the others.
//!
//! # Detection
//! - Bytes that are not YAML at all: `ParseError`
//! - YAML without a `format:` key, or with an unknown marker:
//!   `UnsupportedFormat`
//!
//! # Decoding
//! Strategies decode into serde DTOs, check identifiers, build the model
//! through `SchemaBuilder`, then run structural validation. Any Error-level
//! diagnostic fails the decode, so a successfully decoded model is always
//! exportable.
//!
//! # Mask files
//! [`masks`] reads and writes the plain-text register word files; they are
//! not documents and never go through the registry.

pub mod bits;
pub mod error;
pub mod masks;
pub mod mk1;
pub mod mk2;

pub use error::ParseError;
pub use masks::{MaskHeader, MaskImport, MaskLayout};
pub use mk1::Mk1Format;
pub use mk2::Mk2Format;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::schema::{SchemaBuilder, SchemaModel};
use crate::core::types::{FormatKind, MaskMode};
use crate::core::validator::{MixedGroupPolicy, Validator};
use crate::error::EngineError;

/// Selection block embedded in exported documents
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionBlock {
    #[serde(default)]
    pub mode: MaskMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<MaskEntry>,
}

/// One register word inside a selection block
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaskEntry {
    pub register: String,
    /// `0x`-prefixed, eight hex digits
    pub value: String,
}

/// A decoded document: the model plus its optional selection block
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub model: SchemaModel,
    pub selection: Option<SelectionBlock>,
}

/// One schema generation's reader and writer
pub trait FormatStrategy: Send + Sync {
    fn kind(&self) -> FormatKind;

    /// Value of the `format:` key this strategy claims
    fn marker(&self) -> &'static str {
        self.kind().marker()
    }

    /// True if the document carries this strategy's marker
    fn sniff(&self, bytes: &[u8]) -> bool {
        matches!(read_marker(bytes), Ok(Some(marker)) if marker.eq_ignore_ascii_case(self.marker()))
    }

    fn decode_document(&self, bytes: &[u8]) -> Result<Decoded, ParseError>;

    fn encode_document(
        &self,
        model: &SchemaModel,
        selection: Option<&SelectionBlock>,
    ) -> Result<Vec<u8>, ParseError>;

    fn decode(&self, bytes: &[u8]) -> Result<SchemaModel, ParseError> {
        Ok(self.decode_document(bytes)?.model)
    }

    fn encode(&self, model: &SchemaModel) -> Result<Vec<u8>, ParseError> {
        self.encode_document(model, None)
    }
}

/// Reads the top-level `format:` marker
///
/// `Ok(None)` for YAML that has no usable marker.
pub fn read_marker(bytes: &[u8]) -> Result<Option<String>, ParseError> {
    let document: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    let marker = match document.get("format") {
        Some(serde_yaml::Value::String(s)) => Some(s.trim().to_string()),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    };
    Ok(marker)
}

/// Known strategies, looked up by marker
pub struct FormatRegistry {
    strategies: Vec<Box<dyn FormatStrategy>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Mk1Format));
        registry.register(Box::new(Mk2Format));
        registry
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.marker()))
            .finish()
    }
}

impl FormatRegistry {
    /// Registry with the mk1 and mk2 strategies
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn register(&mut self, strategy: Box<dyn FormatStrategy>) {
        self.strategies.push(strategy);
    }

    /// Picks the strategy for a document
    pub fn detect(&self, bytes: &[u8]) -> Result<&dyn FormatStrategy, EngineError> {
        let Some(marker) = read_marker(bytes)? else {
            return Err(EngineError::UnsupportedFormat { marker: None });
        };
        self.strategies
            .iter()
            .find(|s| marker.eq_ignore_ascii_case(s.marker()))
            .map(|s| s.as_ref())
            .ok_or(EngineError::UnsupportedFormat {
                marker: Some(marker),
            })
    }

    pub fn for_kind(&self, kind: FormatKind) -> Result<&dyn FormatStrategy, EngineError> {
        self.strategies
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_ref())
            .ok_or_else(|| EngineError::UnsupportedFormat {
                marker: Some(kind.marker().to_string()),
            })
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, EngineError> {
        let strategy = self.detect(bytes)?;
        debug!("Decoding {} document ({} bytes)", strategy.marker(), bytes.len());
        Ok(strategy.decode_document(bytes)?)
    }

    pub fn encode(
        &self,
        model: &SchemaModel,
        selection: Option<&SelectionBlock>,
    ) -> Result<Vec<u8>, EngineError> {
        Ok(self.for_kind(model.format())?.encode_document(model, selection)?)
    }
}

/// Fails unless `found` names `expected`
pub(crate) fn check_marker(expected: FormatKind, found: &str) -> Result<(), ParseError> {
    if found.trim().eq_ignore_ascii_case(expected.marker()) {
        Ok(())
    } else {
        Err(ParseError::MarkerMismatch {
            expected,
            found: found.to_string(),
        })
    }
}

/// Builds the model and rejects anything structurally invalid
///
/// Shared tail of every strategy's decode.
pub(crate) fn finish_decode(
    builder: SchemaBuilder,
    selection: Option<SelectionBlock>,
) -> Result<Decoded, ParseError> {
    let model = builder.build()?;

    // The Mixed policy only affects semantic checks
    let report = Validator::new(MixedGroupPolicy::Allow).structural(&model);
    if let Some(error) = report.first_error() {
        return Err(ParseError::Layout {
            code: error.code,
            location: error.location.clone(),
            message: error.message.clone(),
        });
    }

    if let Some(block) = &selection {
        for id in &block.selected {
            if model.field_idx(id).is_err() {
                return Err(ParseError::UnknownSelection(id.clone()));
            }
        }
    }

    Ok(Decoded { model, selection })
}

/// Serialises a document DTO to YAML bytes
pub(crate) fn to_yaml<T: Serialize>(document: &T) -> Result<Vec<u8>, ParseError> {
    Ok(serde_yaml::to_string(document)?.into_bytes())
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests;
