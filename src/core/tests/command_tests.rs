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

//! Command engine tests
//!
//! Tests for undo/redo history:
//! - Apply/undo/redo basics and redo invalidation
//! - Vacuous commands stay out of history
//! - Group batches undo as one unit with recorded prior values
//! - Whole-selection restores are a single batch
//! - Property tests for the inverse and replay laws

use proptest::prelude::*;
use std::sync::Arc;

use super::{nested_mk2, shared, two_register_mk1};
use crate::core::command::{Command, CommandEngine, HistoryEntry};
use crate::core::schema::SchemaModel;
use crate::core::selection::{SelectionSnapshot, SelectionState};
use crate::core::types::{BitState, TriState};
use crate::error::EngineError;

fn setup(model: SchemaModel) -> (SelectionState, CommandEngine) {
    (SelectionState::new(shared(model)), CommandEngine::new())
}

#[test]
fn test_apply_undo_redo() {
    let (mut selection, mut engine) = setup(two_register_mk1());

    assert!(engine
        .apply(&mut selection, &Command::set_leaf("A", BitState::Set))
        .unwrap());
    assert_eq!(selection.get("A").unwrap(), BitState::Set);
    assert!(engine.can_undo());
    assert!(!engine.can_redo());

    assert!(engine.undo(&mut selection));
    assert_eq!(selection.get("A").unwrap(), BitState::Unset);
    assert!(engine.can_redo());

    assert!(engine.redo(&mut selection));
    assert_eq!(selection.get("A").unwrap(), BitState::Set);
    assert!(!engine.can_redo());
}

#[test]
fn test_empty_stacks_are_noops() {
    let (mut selection, mut engine) = setup(two_register_mk1());

    assert!(!engine.undo(&mut selection));
    assert!(!engine.redo(&mut selection));
    assert!(selection.selected_ids().is_empty());
}

#[test]
fn test_vacuous_apply_records_nothing() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    engine
        .apply(&mut selection, &Command::set_leaf("A", BitState::Set))
        .unwrap();
    engine.undo(&mut selection);

    // B is already unset, so this changes nothing
    let changed = engine
        .apply(&mut selection, &Command::set_leaf("B", BitState::Unset))
        .unwrap();

    assert!(!changed);
    assert!(engine.history().is_empty());
    assert_eq!(engine.redo_depth(), 1);
}

#[test]
fn test_new_command_clears_redo() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    engine
        .apply(&mut selection, &Command::set_leaf("A", BitState::Set))
        .unwrap();
    engine.undo(&mut selection);

    engine
        .apply(&mut selection, &Command::set_leaf("B", BitState::Set))
        .unwrap();

    assert!(!engine.can_redo());
    assert!(!engine.redo(&mut selection));
    assert_eq!(selection.selected_ids(), vec!["B"]);
}

#[test]
fn test_unknown_id_leaves_history_untouched() {
    let (mut selection, mut engine) = setup(two_register_mk1());

    let result = engine.apply(&mut selection, &Command::set_group("ghost", BitState::Set));
    assert!(matches!(result, Err(EngineError::NotFound(_))));
    assert!(!engine.can_undo());
}

#[test]
fn test_group_batch_is_one_entry() {
    let (mut selection, mut engine) = setup(nested_mk2());
    engine
        .apply(&mut selection, &Command::set_leaf("rx_err", BitState::Set))
        .unwrap();

    engine
        .apply(&mut selection, &Command::set_group("dma", BitState::Set))
        .unwrap();
    assert_eq!(engine.history().len(), 2);
    match &engine.history()[1] {
        HistoryEntry::SetGroupBatch { leaves, .. } => assert_eq!(leaves.len(), 2),
        other => panic!("expected a batch entry, got {other:?}"),
    }

    // One undo restores the exact prior values, including the leaf that was already set
    engine.undo(&mut selection);
    assert_eq!(selection.get("rx_done").unwrap(), BitState::Unset);
    assert_eq!(selection.get("rx_err").unwrap(), BitState::Set);
    assert_eq!(selection.get("tx").unwrap(), BitState::Unset);
    assert_eq!(selection.derived_state("dma").unwrap(), TriState::Mixed);
}

#[test]
fn test_register_batch() {
    let (mut selection, mut engine) = setup(two_register_mk1());

    engine
        .apply(&mut selection, &Command::set_register("data0", BitState::Set))
        .unwrap();
    assert_eq!(selection.selected_ids(), vec!["A", "B"]);

    engine.undo(&mut selection);
    assert!(selection.selected_ids().is_empty());
}

fn restore(ids: &[&str]) -> Command {
    Command::restore(SelectionSnapshot::from_selected(
        ids.iter().map(|id| id.to_string()).collect(),
    ))
}

#[test]
fn test_restore_is_one_batch() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    engine
        .apply(&mut selection, &Command::set_leaf("A", BitState::Set))
        .unwrap();

    assert!(engine.apply(&mut selection, &restore(&["B", "C"])).unwrap());
    assert_eq!(selection.selected_ids(), vec!["B", "C"]);
    match engine.history().last().unwrap() {
        HistoryEntry::SetGroupBatch { label, leaves } => {
            assert_eq!(label, "Restore selection");
            // A cleared, B and C set
            assert_eq!(leaves.len(), 3);
        }
        other => panic!("expected a batch entry, got {other:?}"),
    }

    engine.undo(&mut selection);
    assert_eq!(selection.selected_ids(), vec!["A"]);
}

#[test]
fn test_restore_of_current_selection_is_vacuous() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    engine
        .apply(&mut selection, &Command::set_leaf("C", BitState::Set))
        .unwrap();

    assert!(!engine.apply(&mut selection, &restore(&["C"])).unwrap());
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_restore_unknown_id_records_nothing() {
    let (mut selection, mut engine) = setup(two_register_mk1());

    let result = engine.apply(&mut selection, &restore(&["A", "ghost"]));
    assert!(matches!(result, Err(EngineError::NotFound(_))));
    assert!(!engine.can_undo());
    assert!(selection.selected_ids().is_empty());
}

#[test]
fn test_toggle() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    let toggle = Command::toggle("C");

    engine.apply(&mut selection, &toggle).unwrap();
    assert_eq!(selection.get("C").unwrap(), BitState::Set);
    engine.apply(&mut selection, &toggle).unwrap();
    assert_eq!(selection.get("C").unwrap(), BitState::Unset);

    assert_eq!(engine.history().len(), 2);
}

#[test]
fn test_descriptions() {
    let (mut selection, mut engine) = setup(nested_mk2());
    let model = selection.model().clone();

    assert_eq!(engine.undo_description(&model), None);

    engine
        .apply(&mut selection, &Command::set_leaf("irq", BitState::Set))
        .unwrap();
    assert_eq!(
        engine.undo_description(&model).as_deref(),
        Some("Set irq to set")
    );

    engine
        .apply(&mut selection, &Command::set_group("dma", BitState::Set))
        .unwrap();
    assert_eq!(
        engine.undo_description(&model).as_deref(),
        Some("Set group dma to set")
    );

    engine.undo(&mut selection);
    assert_eq!(
        engine.redo_description(&model).as_deref(),
        Some("Set group dma to set")
    );
}

#[test]
fn test_clear() {
    let (mut selection, mut engine) = setup(two_register_mk1());
    engine
        .apply(&mut selection, &Command::set_leaf("A", BitState::Set))
        .unwrap();
    engine
        .apply(&mut selection, &Command::set_leaf("B", BitState::Set))
        .unwrap();
    engine.undo(&mut selection);

    engine.clear();

    assert!(!engine.can_undo());
    assert!(!engine.can_redo());
    // Clearing history keeps the selection
    assert_eq!(selection.selected_ids(), vec!["A"]);
}

const LEAVES: [&str; 4] = ["rx_done", "rx_err", "tx", "irq"];
const GROUPS: [&str; 2] = ["dma", "dma.rx"];

fn bit_state() -> impl Strategy<Value = BitState> {
    any::<bool>().prop_map(BitState::from)
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (prop::sample::select(&LEAVES[..]), bit_state())
            .prop_map(|(id, value)| Command::set_leaf(id, value)),
        prop::sample::select(&LEAVES[..]).prop_map(Command::toggle),
        (prop::sample::select(&GROUPS[..]), bit_state())
            .prop_map(|(id, value)| Command::set_group(id, value)),
        bit_state().prop_map(|value| Command::set_register("ctrl", value)),
        prop::sample::subsequence(LEAVES.to_vec(), 0..=LEAVES.len()).prop_map(|ids| restore(&ids)),
    ]
}

proptest! {
    #[test]
    fn prop_apply_then_undo_is_identity(
        prefix in prop::collection::vec(command(), 0..12),
        last in command(),
    ) {
        let model: Arc<SchemaModel> = shared(nested_mk2());
        let mut selection = SelectionState::new(model);
        let mut engine = CommandEngine::new();
        for cmd in &prefix {
            engine.apply(&mut selection, cmd).unwrap();
        }

        let before = selection.clone();
        if engine.apply(&mut selection, &last).unwrap() {
            prop_assert!(engine.undo(&mut selection));
        }
        prop_assert_eq!(selection, before);
    }

    #[test]
    fn prop_replay_reproduces_selection(
        commands in prop::collection::vec(command(), 0..16),
        undos in 0usize..8,
    ) {
        let model = shared(nested_mk2());
        let mut selection = SelectionState::new(model.clone());
        let mut engine = CommandEngine::new();
        for cmd in &commands {
            engine.apply(&mut selection, cmd).unwrap();
        }
        for _ in 0..undos {
            engine.undo(&mut selection);
        }

        prop_assert_eq!(engine.replay(model), selection);
    }

    #[test]
    fn prop_undo_all_then_redo_all(commands in prop::collection::vec(command(), 1..16)) {
        let model = shared(nested_mk2());
        let mut selection = SelectionState::new(model.clone());
        let mut engine = CommandEngine::new();
        for cmd in &commands {
            engine.apply(&mut selection, cmd).unwrap();
        }
        let after = selection.clone();

        while engine.undo(&mut selection) {}
        prop_assert_eq!(&selection, &SelectionState::new(model));

        while engine.redo(&mut selection) {}
        prop_assert_eq!(selection, after);
    }
}
