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

use super::MK1_DOC;
use crate::core::schema::{FieldDecl, GroupDecl, SchemaBuilder};
use crate::core::types::{BitRange, FormatKind};
use crate::core::validator::DiagnosticCode;
use crate::format::{FormatStrategy, Mk1Format, ParseError};

#[test]
fn test_decode_flat_registers() {
    let model = Mk1Format.decode(MK1_DOC.as_bytes()).unwrap();

    assert_eq!(model.format(), FormatKind::Mk1);
    assert_eq!(model.list_registers().len(), 2);
    assert_eq!(model.find_register("data1").unwrap().width, 16);
    assert!(model.groups().is_empty());

    let a = model.find_field("A").unwrap();
    assert_eq!(a.label, "Alpha");
    assert_eq!(a.range, BitRange::new(0, 4));
    assert_eq!(a.attrs.source.as_deref(), Some("cpu"));

    // Width defaults to a single bit, label to the id
    let c = model.find_field("C").unwrap();
    assert_eq!(c.range, BitRange::new(0, 1));
    assert_eq!(c.label, "C");
    assert!(c.attrs.deprecated);
    assert_eq!(c.attrs.description.as_deref(), Some("Legacy interrupt"));
}

#[test]
fn test_overlap_fails_decode() {
    let doc = br#"
format: mk1
registers:
  - id: data0
    fields:
      - { id: A, offset: 0, width: 4 }
      - { id: B, offset: 2, width: 4 }
"#;

    match Mk1Format.decode(doc) {
        Err(ParseError::Layout { code, location, .. }) => {
            assert_eq!(code, DiagnosticCode::Overlap);
            assert_eq!(location.as_deref(), Some("B"));
        }
        other => panic!("expected an overlap error, got {other:?}"),
    }
}

#[test]
fn test_register_limit() {
    let mut doc = String::from("format: mk1\nregisters:\n");
    for i in 0..13 {
        doc.push_str(&format!("  - id: r{i}\n"));
    }

    assert!(matches!(
        Mk1Format.decode(doc.as_bytes()),
        Err(ParseError::Layout {
            code: DiagnosticCode::TooManyRegisters,
            ..
        })
    ));
}

#[test]
fn test_field_outside_register() {
    let doc = br#"
format: mk1
registers:
  - id: narrow
    width: 8
    fields:
      - { id: A, offset: 6, width: 4 }
"#;

    assert!(matches!(
        Mk1Format.decode(doc),
        Err(ParseError::Layout {
            code: DiagnosticCode::OutOfRegister,
            ..
        })
    ));
}

#[test]
fn test_unknown_keys_rejected() {
    let doc = br#"
format: mk1
registers:
  - id: data0
    fields:
      - { id: A, offset: 0, colour: red }
"#;

    assert!(matches!(Mk1Format.decode(doc), Err(ParseError::Yaml(_))));
}

#[test]
fn test_groups_key_rejected() {
    let doc = br#"
format: mk1
registers:
  - id: data0
    groups:
      - { id: g, span: "0-3" }
"#;

    assert!(matches!(Mk1Format.decode(doc), Err(ParseError::Yaml(_))));
}

#[test]
fn test_invalid_identifier() {
    let doc = br#"
format: mk1
registers:
  - id: data0
    fields:
      - { id: "9lives", offset: 0 }
"#;

    assert!(matches!(
        Mk1Format.decode(doc),
        Err(ParseError::InvalidIdentifier(id)) if id == "9lives"
    ));
}

#[test]
fn test_marker_mismatch() {
    assert!(matches!(
        Mk1Format.decode(b"format: mk2\nregisters: []\n"),
        Err(ParseError::MarkerMismatch {
            expected: FormatKind::Mk1,
            ..
        })
    ));
}

#[test]
fn test_encode_rejects_groups() {
    let mut builder = SchemaBuilder::new(FormatKind::Mk1);
    let reg = builder.register("data0", 32);
    builder
        .group(reg, GroupDecl::new("g", BitRange::new(0, 4)))
        .field(reg, FieldDecl::new("A", BitRange::new(0, 4)).in_group("g"));
    let model = builder.build().unwrap();

    assert!(matches!(
        Mk1Format.encode(&model),
        Err(ParseError::Unrepresentable { what, .. }) if what == "groups"
    ));
}

#[test]
fn test_encode_rejects_other_generation() {
    let mut builder = SchemaBuilder::new(FormatKind::Mk2);
    builder.register("ctrl", 32);
    let model = builder.build().unwrap();

    assert!(matches!(
        Mk1Format.encode(&model),
        Err(ParseError::MarkerMismatch { .. })
    ));
}

#[test]
fn test_encode_writes_marker_first() {
    let model = Mk1Format.decode(MK1_DOC.as_bytes()).unwrap();
    let text = String::from_utf8(Mk1Format.encode(&model).unwrap()).unwrap();

    assert!(text.starts_with("format: mk1\n"));
    assert!(!text.contains("selection"));
}
