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

//! Selection state tests
//!
//! - Leaf set/no-op semantics
//! - Group and register expansion
//! - Derived tri-state
//! - Snapshot round-trip and all-or-nothing restore

use super::{nested_mk2, nested_mk2_with_empty_group, shared, two_register_mk1};
use crate::core::mask::mask_words;
use crate::core::schema::{FieldDecl, SchemaBuilder};
use crate::core::selection::{SelectionSnapshot, SelectionState};
use crate::core::types::{BitRange, BitState, FormatKind, TriState};
use crate::error::EngineError;

#[test]
fn test_starts_all_unset() {
    let selection = SelectionState::new(shared(nested_mk2()));

    for field in selection.model().fields() {
        assert_eq!(selection.get(&field.id).unwrap(), BitState::Unset);
    }
    assert!(selection.selected_ids().is_empty());
}

#[test]
fn test_set_leaf_reports_change_once() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));

    let change = selection.set_leaf("A", BitState::Set).unwrap().unwrap();
    assert_eq!(change.prior, BitState::Unset);
    assert_eq!(change.value, BitState::Set);

    // Same value again is a no-op, not an error
    assert!(selection.set_leaf("A", BitState::Set).unwrap().is_none());
    assert_eq!(selection.get("A").unwrap(), BitState::Set);
}

#[test]
fn test_unknown_ids_fail() {
    let mut selection = SelectionState::new(shared(nested_mk2()));

    assert!(matches!(
        selection.set_leaf("ghost", BitState::Set),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        selection.set_group("ghost", BitState::Set),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        selection.derived_state("ghost"),
        Err(EngineError::NotFound(_))
    ));
    // A group id is not a leaf
    assert!(matches!(
        selection.set_leaf("dma", BitState::Set),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_set_group_reports_only_changed_leaves() {
    let mut selection = SelectionState::new(shared(nested_mk2()));
    selection.set_leaf("rx_err", BitState::Set).unwrap();

    let changes = selection.set_group("dma", BitState::Set).unwrap();
    let model = selection.model().clone();
    let ids: Vec<&str> = changes.iter().map(|c| model.field(c.field).id.as_str()).collect();
    assert_eq!(ids, vec!["rx_done", "tx"]);

    assert!(selection.set_group("dma", BitState::Set).unwrap().is_empty());
}

#[test]
fn test_derived_state_mixed_then_set() {
    let mut selection = SelectionState::new(shared(nested_mk2()));

    selection.set_leaf("rx_done", BitState::Set).unwrap();
    assert_eq!(selection.derived_state("dma.rx").unwrap(), TriState::Mixed);
    assert_eq!(selection.derived_state("dma").unwrap(), TriState::Mixed);
    assert_eq!(selection.derived_state("rx_done").unwrap(), TriState::Set);

    selection.set_leaf("rx_err", BitState::Set).unwrap();
    assert_eq!(selection.derived_state("dma.rx").unwrap(), TriState::Set);
    assert_eq!(selection.derived_state("dma").unwrap(), TriState::Mixed);

    selection.set_leaf("tx", BitState::Set).unwrap();
    assert_eq!(selection.derived_state("dma").unwrap(), TriState::Set);

    selection.set_group("dma", BitState::Unset).unwrap();
    assert_eq!(selection.derived_state("dma").unwrap(), TriState::Unset);
}

#[test]
fn test_empty_group_is_unset() {
    let mut selection = SelectionState::new(shared(nested_mk2_with_empty_group()));
    selection.set_group("dma", BitState::Set).unwrap();

    assert_eq!(selection.derived_state("idle").unwrap(), TriState::Unset);
    assert!(selection.set_group("idle", BitState::Set).unwrap().is_empty());
}

#[test]
fn test_set_register() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));

    let changes = selection.set_register("data0", BitState::Set).unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(selection.selected_ids(), vec!["A", "B"]);
    assert_eq!(selection.get("C").unwrap(), BitState::Unset);
}

#[test]
fn test_snapshot_restore_reproduces_state() {
    let model = shared(nested_mk2());
    let mut selection = SelectionState::new(model.clone());
    selection.set_leaf("rx_done", BitState::Set).unwrap();
    selection.set_leaf("irq", BitState::Set).unwrap();

    let snapshot = selection.snapshot();
    let mut restored = SelectionState::new(model.clone());
    let changes = restored.restore(&snapshot).unwrap();
    assert_eq!(changes.len(), 2);

    for field in model.fields() {
        assert_eq!(restored.get(&field.id).unwrap(), selection.get(&field.id).unwrap());
    }
    for group in model.groups() {
        assert_eq!(
            restored.derived_state(&group.id).unwrap(),
            selection.derived_state(&group.id).unwrap()
        );
    }
    assert_eq!(restored, selection);
}

#[test]
fn test_restore_reports_only_changed_leaves() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));
    selection.set_leaf("A", BitState::Set).unwrap();
    selection.set_leaf("B", BitState::Set).unwrap();

    let snapshot = SelectionSnapshot::from_selected(vec!["B".to_string(), "C".to_string()]);
    let changes = selection.restore(&snapshot).unwrap();

    let changed: Vec<(&str, BitState, BitState)> = changes
        .iter()
        .map(|c| (selection.model().field(c.field).id.as_str(), c.prior, c.value))
        .collect();
    assert_eq!(
        changed,
        vec![
            ("A", BitState::Set, BitState::Unset),
            ("C", BitState::Unset, BitState::Set),
        ]
    );
    assert_eq!(selection.selected_ids(), vec!["B", "C"]);
}

#[test]
fn test_snapshot_serde_round_trip() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));
    selection.set_leaf("B", BitState::Set).unwrap();

    let yaml = serde_yaml::to_string(&selection.snapshot()).unwrap();
    let parsed: SelectionSnapshot = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.selected(), ["B".to_string()]);
}

#[test]
fn test_restore_is_all_or_nothing() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));
    selection.set_leaf("A", BitState::Set).unwrap();

    let bad = SelectionSnapshot::from_selected(vec!["B".to_string(), "ghost".to_string()]);
    assert!(matches!(selection.restore(&bad), Err(EngineError::NotFound(_))));

    assert_eq!(selection.selected_ids(), vec!["A"]);
}

#[test]
fn test_mask_words_per_register() {
    let mut selection = SelectionState::new(shared(two_register_mk1()));
    selection.set_leaf("A", BitState::Set).unwrap();
    selection.set_leaf("C", BitState::Set).unwrap();

    let words = mask_words(&selection);
    assert_eq!(words.len(), 2);
    assert_eq!((words[0].register.as_str(), words[0].value), ("data0", 0x0000_000F));
    assert_eq!((words[1].register.as_str(), words[1].value), ("data1", 0x0000_0001));
}

#[test]
fn test_mk2_mask_words_clear_reserved_bits() {
    // Structurally invalid on purpose: the field reaches into bits 28-31
    let mut builder = SchemaBuilder::new(FormatKind::Mk2);
    let reg = builder.register("ctrl", 32);
    builder.field(reg, FieldDecl::new("wide", BitRange::new(24, 8)));
    let mut selection = SelectionState::new(shared(builder.build().unwrap()));

    selection.set_leaf("wide", BitState::Set).unwrap();
    assert_eq!(mask_words(&selection)[0].value, 0x0F00_0000);
}
