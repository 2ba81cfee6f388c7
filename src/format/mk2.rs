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

//! src/format/mk2.rs
//!
//! mk2 definitions: registers with nested groups
//!
//! ```yaml
//! format: mk2
//! base_address: "0x40000000"
//! registers:
//!   - id: ctrl
//!     groups:
//!       - id: dma
//!         span: "0-7"
//!       - id: dma.rx
//!         span: "0-3"
//!         parent: dma
//!         exclusive: true
//!     fields:
//!       - id: rx_done
//!         bits: "0"
//!         group: dma.rx
//! ```
//!
//! Bits use `"n"` or inclusive `"lo-hi"` notation. At most 16 registers;
//! bits 28-31 are reserved and never assignable.

use serde::{Deserialize, Serialize};

use crate::core::schema::{FieldDecl, GroupDecl, SchemaBuilder, SchemaModel};
use crate::core::types::{BitRange, FieldAttrs, FormatKind};
use crate::format::bits::{check_identifier, format_address, parse_address, parse_bit_range};
use crate::format::{
    check_marker, finish_decode, is_false, to_yaml, Decoded, FormatStrategy, ParseError,
    SelectionBlock,
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk2Document {
    format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_address: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
    #[serde(default)]
    registers: Vec<Mk2Register>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection: Option<SelectionBlock>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk2Register {
    id: String,
    #[serde(default = "default_register_width")]
    width: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    groups: Vec<Mk2Group>,
    #[serde(default)]
    fields: Vec<Mk2Field>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk2Group {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    span: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    exclusive: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Mk2Field {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    bits: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    deprecated: bool,
}

/// YAML reads `bits: 5` and `base_address: 0x10` as numbers
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum Scalar {
    Number(u32),
    Text(String),
}

impl Scalar {
    fn bit_range(&self) -> Result<BitRange, ParseError> {
        match self {
            Scalar::Number(bit) => Ok(BitRange::new(*bit, 1)),
            Scalar::Text(text) => parse_bit_range(text),
        }
    }

    fn address(&self) -> Result<u32, ParseError> {
        match self {
            Scalar::Number(address) => Ok(*address),
            Scalar::Text(text) => parse_address(text),
        }
    }

    fn from_range(id: &str, range: BitRange) -> Result<Self, ParseError> {
        if range.is_empty() {
            return Err(ParseError::Unrepresentable {
                format: FormatKind::Mk2,
                what: format!("the zero-width range of '{id}'"),
            });
        }
        Ok(Scalar::Text(range.to_string()))
    }
}

fn default_register_width() -> u32 {
    32
}

/// Strategy for `format: mk2` documents
#[derive(Clone, Copy, Debug, Default)]
pub struct Mk2Format;

impl FormatStrategy for Mk2Format {
    fn kind(&self) -> FormatKind {
        FormatKind::Mk2
    }

    fn decode_document(&self, bytes: &[u8]) -> Result<Decoded, ParseError> {
        let document: Mk2Document = serde_yaml::from_slice(bytes)?;
        check_marker(FormatKind::Mk2, &document.format)?;

        let mut builder = SchemaBuilder::new(FormatKind::Mk2);
        builder.sources(document.sources);
        builder.base_address(document.base_address.as_ref().map(Scalar::address).transpose()?);

        for register in document.registers {
            check_identifier(&register.id)?;
            let reg = builder.register(register.id, register.width);

            for group in register.groups {
                check_identifier(&group.id)?;
                let mut decl = GroupDecl::new(group.id, group.span.bit_range()?);
                if let Some(label) = group.label {
                    decl = decl.label(label);
                }
                if let Some(parent) = group.parent {
                    decl = decl.parent(parent);
                }
                decl.exclusive = group.exclusive;
                builder.group(reg, decl);
            }

            for field in register.fields {
                check_identifier(&field.id)?;
                let mut decl = FieldDecl::new(field.id, field.bits.bit_range()?);
                if let Some(label) = field.label {
                    decl = decl.label(label);
                }
                decl.group = field.group;
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
        if model.format() != FormatKind::Mk2 {
            return Err(ParseError::MarkerMismatch {
                expected: FormatKind::Mk2,
                found: model.format().to_string(),
            });
        }

        let mut registers = Vec::with_capacity(model.list_registers().len());
        for register in model.list_registers() {
            let mut groups = Vec::with_capacity(register.groups.len());
            for idx in &register.groups {
                let group = model.group(*idx);
                groups.push(Mk2Group {
                    id: group.id.clone(),
                    label: Some(group.label.clone()),
                    span: Scalar::from_range(&group.id, group.span)?,
                    parent: group.parent.map(|p| model.group(p).id.clone()),
                    exclusive: group.exclusive,
                });
            }

            let mut fields = Vec::with_capacity(register.fields.len());
            for idx in &register.fields {
                let field = model.field(*idx);
                fields.push(Mk2Field {
                    id: field.id.clone(),
                    label: Some(field.label.clone()),
                    bits: Scalar::from_range(&field.id, field.range)?,
                    group: field.parent.map(|p| model.group(p).id.clone()),
                    description: field.attrs.description.clone(),
                    source: field.attrs.source.clone(),
                    deprecated: field.attrs.deprecated,
                });
            }

            registers.push(Mk2Register {
                id: register.id.clone(),
                width: register.width,
                groups,
                fields,
            });
        }

        to_yaml(&Mk2Document {
            format: FormatKind::Mk2.marker().to_string(),
            base_address: model.base_address().map(|a| Scalar::Text(format_address(a))),
            sources: model.sources().to_vec(),
            registers,
            selection: selection.cloned(),
        })
    }
}
