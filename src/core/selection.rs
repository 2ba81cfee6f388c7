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

//! src/core/selection.rs
//!
//! Tri-state selection over a loaded schema model
//!
//! Only leaf fields carry state (`BitState`). Group state is derived on
//! demand from the leaves below it and is never stored, so it cannot drift
//! out of sync with its children.
//!
//! Mutators report exactly which leaves changed. Setting a leaf to the value
//! it already has changes nothing and reports nothing, which is what keeps
//! vacuous entries out of the undo history.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::core::schema::SchemaModel;
use crate::core::types::{BitState, FieldIdx, NodeRef, TriState};
use crate::error::EngineError;

/// One leaf transition, with the value it replaced
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafChange {
    pub field: FieldIdx,
    pub prior: BitState,
    pub value: BitState,
}

/// Serializable copy of a selection, keyed by field identifier
///
/// Only the selected ids are recorded; everything else restores as Unset.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    selected: Vec<String>,
}

impl SelectionSnapshot {
    pub(crate) fn from_selected(selected: Vec<String>) -> Self {
        Self { selected }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }
}

/// Leaf states for every field of one model
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectionState {
    model: Arc<SchemaModel>,
    leaves: Vec<BitState>,
}

impl SelectionState {
    /// Fresh selection with every leaf Unset
    pub fn new(model: Arc<SchemaModel>) -> Self {
        let leaves = vec![BitState::Unset; model.leaf_count()];
        Self { model, leaves }
    }

    pub fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    pub fn get(&self, field_id: &str) -> Result<BitState, EngineError> {
        Ok(self.leaf(self.model.field_idx(field_id)?))
    }

    pub fn leaf(&self, field: FieldIdx) -> BitState {
        self.leaves[field.index()]
    }

    pub fn set_leaf(
        &mut self,
        field_id: &str,
        value: BitState,
    ) -> Result<Option<LeafChange>, EngineError> {
        let field = self.model.field_idx(field_id)?;
        Ok(self.change_leaf(field, value))
    }

    /// Sets every leaf below a group; returns only the leaves that changed
    pub fn set_group(
        &mut self,
        group_id: &str,
        value: BitState,
    ) -> Result<Vec<LeafChange>, EngineError> {
        let group = self.model.group_idx(group_id)?;
        let leaves = self.model.group_leaves(group);
        Ok(self.change_leaves(&leaves, value))
    }

    /// Sets every leaf declared in a register; returns only the leaves that changed
    pub fn set_register(
        &mut self,
        register_id: &str,
        value: BitState,
    ) -> Result<Vec<LeafChange>, EngineError> {
        let register = self.model.register_idx(register_id)?;
        let leaves = self.model.register_leaves(register).to_vec();
        Ok(self.change_leaves(&leaves, value))
    }

    /// Display state of a field or group
    pub fn derived_state(&self, id: &str) -> Result<TriState, EngineError> {
        Ok(self.node_state(self.model.resolve(id)?))
    }

    pub fn node_state(&self, node: NodeRef) -> TriState {
        match node {
            NodeRef::Field(field) => self.leaf(field).into(),
            NodeRef::Group(group) => {
                let leaves = self.model.group_leaves(group);
                let set = leaves.iter().filter(|f| self.leaf(**f).is_set()).count();
                if set == 0 {
                    TriState::Unset
                } else if set == leaves.len() {
                    TriState::Set
                } else {
                    TriState::Mixed
                }
            }
        }
    }

    /// Identifiers of the Set leaves, in declaration order
    pub fn selected_ids(&self) -> Vec<&str> {
        self.model
            .fields()
            .iter()
            .zip(&self.leaves)
            .filter(|(_, state)| state.is_set())
            .map(|(field, _)| field.id.as_str())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.leaves.iter().filter(|s| s.is_set()).count()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot::from_selected(
            self.selected_ids().into_iter().map(str::to_string).collect(),
        )
    }

    /// Replaces every leaf state with the snapshot's
    ///
    /// Returns the leaves that changed, in declaration order. Fails without
    /// touching the selection if any id is unknown.
    pub fn restore(
        &mut self,
        snapshot: &SelectionSnapshot,
    ) -> Result<Vec<LeafChange>, EngineError> {
        let mut target = vec![BitState::Unset; self.leaves.len()];
        for id in &snapshot.selected {
            target[self.model.field_idx(id)?.index()] = BitState::Set;
        }

        Ok(target
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| self.change_leaf(FieldIdx(i), value))
            .collect())
    }

    /// Raw leaf write used by history replay; records nothing
    pub(crate) fn write_leaf(&mut self, field: FieldIdx, value: BitState) {
        trace!("Leaf {} -> {}", self.model.field(field).id, value);
        self.leaves[field.index()] = value;
    }

    fn change_leaf(&mut self, field: FieldIdx, value: BitState) -> Option<LeafChange> {
        let prior = self.leaf(field);
        if prior == value {
            return None;
        }
        self.write_leaf(field, value);
        Some(LeafChange {
            field,
            prior,
            value,
        })
    }

    fn change_leaves(&mut self, fields: &[FieldIdx], value: BitState) -> Vec<LeafChange> {
        fields
            .iter()
            .filter_map(|field| self.change_leaf(*field, value))
            .collect()
    }
}
