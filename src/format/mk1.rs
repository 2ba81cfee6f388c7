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

//! src/format/mk1.rs
//!
//! mk1 definitions: flat registers of fields with explicit offset + width
//!
//! ```yaml
//! format: mk1
//! sources: [cpu, dma]
//! registers:
//!   - id: data0
//!     width: 32
//!     fields:
//!       - id: A
//!         label: Alpha
//!         offset: 0
//!         width: 4
//!         source: cpu
//! ```
//!
//! At most 12 registers. Groups do not exist in this generation.

use serde::{Deserialize, Serialize};

use crate::core::schema::{FieldDecl, SchemaBuilder, SchemaModel};
use crate::core::types::{BitRange, FieldAttrs, FormatKind};
use crate::format::bits::check_identifier;
use crate::format::{
    check_marker, finish_decode, is_false, to_yaml, Decoded, FormatStrategy, ParseError,
    SelectionBlock,
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk1Document {
    format: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
    #[serde(default)]
    registers: Vec<Mk1Register>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection: Option<SelectionBlock>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk1Register {
    id: String,
    #[serde(default = "default_register_width")]
    width: u32,
    #[serde(default)]
    fields: Vec<Mk1Field>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk1Field {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    offset: u32,
    #[serde(default = "default_field_width")]
    width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    deprecated: bool,
}

fn default_register_width() -> u32 {
    32
}

fn default_field_width() -> u32 {
    1
}

/// Strategy for `format: mk1` documents
#[derive(Clone, Copy, Debug, Default)]
pub struct Mk1Format;

impl FormatStrategy for Mk1Format {
    fn kind(&self) -> FormatKind {
        FormatKind::Mk1
    }

    fn decode_document(&self, bytes: &[u8]) -> Result<Decoded, ParseError> {
        let document: Mk1Document = serde_yaml::from_slice(bytes)?;
        check_marker(FormatKind::Mk1, &document.format)?;

        let mut builder = SchemaBuilder::new(FormatKind::Mk1);
        builder.sources(document.sources);

        for register in document.registers {
            check_identifier(&register.id)?;
            let reg = builder.register(register.id, register.width);

            for field in register.fields {
                check_identifier(&field.id)?;
                let mut decl = FieldDecl::new(field.id, BitRange::new(field.offset, field.width));
                if let Some(label) = field.label {
                    decl = decl.label(label);
                }
                decl.attrs = FieldAttrs {
                    deprecated: field.deprecated,
                    description: field.description,
                    source: field.source,
                };
                builder.field(reg, decl);
            }
        }

        finish_decode(builder, document.selection)
    }

    fn encode_document(
        &self,
        model: &SchemaModel,
        selection: Option<&SelectionBlock>,
    ) -> Result<Vec<u8>, ParseError> {
        if model.format() != FormatKind::Mk1 {
            return Err(ParseError::MarkerMismatch {
                expected: FormatKind::Mk1,
                found: model.format().to_string(),
            });
        }
        if !model.groups().is_empty() {
            return Err(ParseError::Unrepresentable {
                format: FormatKind::Mk1,
                what: "groups".to_string(),
            });
        }
        if model.base_address().is_some() {
            return Err(ParseError::Unrepresentable {
                format: FormatKind::Mk1,
                what: "a base address".to_string(),
            });
        }

        let registers = model
            .list_registers()
            .iter()
            .map(|register| Mk1Register {
                id: register.id.clone(),
                width: register.width,
                fields: register
                    .fields
                    .iter()
                    .map(|idx| {
                        let field = model.field(*idx);
                        Mk1Field {
                            id: field.id.clone(),
                            label: Some(field.label.clone()),
                            offset: field.range.offset,
                            width: field.range.width,
                            description: field.attrs.description.clone(),
                            source: field.attrs.source.clone(),
                            deprecated: field.attrs.deprecated,
                        }
                    })
                    .collect(),
            })
            .collect();

        to_yaml(&Mk1Document {
            format: FormatKind::Mk1.marker().to_string(),
            sources: model.sources().to_vec(),
            registers,
            selection: selection.cloned(),
        })
    }
}
