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

//! src/core/command.rs
//!
//! Undo/redo history for selection changes
//!
//! A [`Command`] is a request ("set group X"). Applying it yields a
//! [`HistoryEntry`] that records every leaf it actually changed together
//! with the prior value, so undo restores recorded values instead of
//! re-deriving them. Group, register and restore commands become a single
//! batch entry that undoes and redoes as one unit.
//!
//! History is linear: a new, non-vacuous command clears the redo stack.
//! Replaying the undo stack forward from an all-Unset selection reproduces
//! the current selection.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::schema::SchemaModel;
use crate::core::selection::{LeafChange, SelectionSnapshot, SelectionState};
use crate::core::types::BitState;
use crate::error::EngineError;

/// A requested selection mutation
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    SetLeaf { field: String, value: BitState },
    ToggleLeaf { field: String },
    SetGroup { group: String, value: BitState },
    SetRegister { register: String, value: BitState },
    /// Replace the whole selection, e.g. from a loaded document or mask file
    Restore { snapshot: SelectionSnapshot },
}

impl Command {
    pub fn set_leaf(field: impl Into<String>, value: BitState) -> Self {
        Command::SetLeaf {
            field: field.into(),
            value,
        }
    }

    pub fn toggle(field: impl Into<String>) -> Self {
        Command::ToggleLeaf {
            field: field.into(),
        }
    }

    pub fn set_group(group: impl Into<String>, value: BitState) -> Self {
        Command::SetGroup {
            group: group.into(),
            value,
        }
    }

    pub fn set_register(register: impl Into<String>, value: BitState) -> Self {
        Command::SetRegister {
            register: register.into(),
            value,
        }
    }

    pub fn restore(snapshot: SelectionSnapshot) -> Self {
        Command::Restore { snapshot }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLeaf { field, value } => write!(f, "Set {field} to {value}"),
            Command::ToggleLeaf { field } => write!(f, "Toggle {field}"),
            Command::SetGroup { group, value } => write!(f, "Set group {group} to {value}"),
            Command::SetRegister { register, value } => {
                write!(f, "Set register {register} to {value}")
            }
            Command::Restore { .. } => f.write_str("Restore selection"),
        }
    }
}

/// A recorded, reversible history entry
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HistoryEntry {
    SetLeaf(LeafChange),
    SetGroupBatch {
        label: String,
        leaves: Vec<LeafChange>,
    },
}

impl HistoryEntry {
    pub fn changes(&self) -> &[LeafChange] {
        match self {
            HistoryEntry::SetLeaf(change) => std::slice::from_ref(change),
            HistoryEntry::SetGroupBatch { leaves, .. } => leaves,
        }
    }

    pub fn describe(&self, model: &SchemaModel) -> String {
        match self {
            HistoryEntry::SetLeaf(change) => {
                format!("Set {} to {}", model.field(change.field).id, change.value)
            }
            HistoryEntry::SetGroupBatch { label, .. } => label.clone(),
        }
    }

    fn apply_forward(&self, selection: &mut SelectionState) {
        for change in self.changes() {
            selection.write_leaf(change.field, change.value);
        }
    }

    fn apply_inverse(&self, selection: &mut SelectionState) {
        for change in self.changes().iter().rev() {
            selection.write_leaf(change.field, change.prior);
        }
    }
}

/// Undo and redo stacks over one selection
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandEngine {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl CommandEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a command and records it
    ///
    /// Returns `Ok(false)` when the command changed nothing; in that case
    /// nothing is pushed and the redo stack is left alone.
    pub fn apply(
        &mut self,
        selection: &mut SelectionState,
        command: &Command,
    ) -> Result<bool, EngineError> {
        let entry = match command {
            Command::SetLeaf { field, value } => {
                selection.set_leaf(field, *value)?.map(HistoryEntry::SetLeaf)
            }
            Command::ToggleLeaf { field } => {
                let current = selection.get(field)?;
                selection
                    .set_leaf(field, current.toggled())?
                    .map(HistoryEntry::SetLeaf)
            }
            Command::SetGroup { group, value } => {
                batch(command, selection.set_group(group, *value)?)
            }
            Command::SetRegister { register, value } => {
                batch(command, selection.set_register(register, *value)?)
            }
            Command::Restore { snapshot } => batch(command, selection.restore(snapshot)?),
        };

        let Some(entry) = entry else {
            debug!("Command '{}' changed nothing", command);
            return Ok(false);
        };

        debug!(
            "Applied '{}' ({} leaf change(s))",
            command,
            entry.changes().len()
        );
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        Ok(true)
    }

    /// Reverts the most recent entry; false if there is none
    pub fn undo(&mut self, selection: &mut SelectionState) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        entry.apply_inverse(selection);
        debug!("Undid '{}'", entry.describe(selection.model()));
        self.redo_stack.push(entry);
        true
    }

    /// Re-applies the most recently undone entry; false if there is none
    pub fn redo(&mut self, selection: &mut SelectionState) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        entry.apply_forward(selection);
        debug!("Redid '{}'", entry.describe(selection.model()));
        self.undo_stack.push(entry);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_description(&self, model: &SchemaModel) -> Option<String> {
        self.undo_stack.last().map(|entry| entry.describe(model))
    }

    pub fn redo_description(&self, model: &SchemaModel) -> Option<String> {
        self.redo_stack.last().map(|entry| entry.describe(model))
    }

    /// Undo stack, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Rebuilds a selection by replaying the undo stack from all-Unset
    pub fn replay(&self, model: Arc<SchemaModel>) -> SelectionState {
        let mut selection = SelectionState::new(model);
        for entry in &self.undo_stack {
            entry.apply_forward(&mut selection);
        }
        selection
    }
}

fn batch(command: &Command, leaves: Vec<LeafChange>) -> Option<HistoryEntry> {
    if leaves.is_empty() {
        return None;
    }
    Some(HistoryEntry::SetGroupBatch {
        label: command.to_string(),
        leaves,
    })
}
