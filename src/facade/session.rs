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

//! src/facade/session.rs
//!
//! One open definition: model, per-mode selections and histories, latest
//! diagnostics
//!
//! The event mask and the capture mask are independent selections over the
//! same model, each with its own undo/redo history. The session's mode picks
//! which one commands, validation and export act on.
//!
//! Sessions are plain values. Nothing is global, so independent sessions
//! (one per open file, or one per test) coexist freely. Mutation goes
//! through [`Facade`](crate::facade::Facade); this type only exposes reads.

use std::sync::Arc;

use crate::core::command::CommandEngine;
use crate::core::mask::{mask_words, MaskWord};
use crate::core::schema::SchemaModel;
use crate::core::selection::{SelectionSnapshot, SelectionState};
use crate::core::types::MaskMode;
use crate::core::validator::{DiagnosticsReport, Validator};

/// Selection and history for one mask mode
#[derive(Clone, Debug)]
pub(crate) struct MaskSlot {
    pub(crate) selection: SelectionState,
    pub(crate) history: CommandEngine,
}

impl MaskSlot {
    fn new(model: &Arc<SchemaModel>) -> Self {
        Self {
            selection: SelectionState::new(Arc::clone(model)),
            history: CommandEngine::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) model: Arc<SchemaModel>,
    event: MaskSlot,
    capture: MaskSlot,
    pub(crate) validator: Validator,
    /// Computed once per model
    pub(crate) structural: DiagnosticsReport,
    /// Structural plus semantic for the active mode, as of the last mutation
    pub(crate) diagnostics: DiagnosticsReport,
    pub(crate) mode: MaskMode,
}

impl Session {
    pub(crate) fn new(model: Arc<SchemaModel>, validator: Validator, mode: MaskMode) -> Self {
        let structural = validator.structural(&model);
        let mut session = Self {
            event: MaskSlot::new(&model),
            capture: MaskSlot::new(&model),
            model,
            validator,
            diagnostics: structural.clone(),
            structural,
            mode,
        };
        session.revalidate();
        session
    }

    /// Re-runs semantic validation of the active mode and stores the
    /// combined report
    pub(crate) fn revalidate(&mut self) -> DiagnosticsReport {
        let mut report = self.structural.clone();
        report.merge(self.validator.semantic(&self.model, self.selection()));
        self.diagnostics = report.clone();
        report
    }

    pub(crate) fn slot(&self, mode: MaskMode) -> &MaskSlot {
        match mode {
            MaskMode::EventMask => &self.event,
            MaskMode::CaptureMask => &self.capture,
        }
    }

    pub(crate) fn slot_mut(&mut self, mode: MaskMode) -> &mut MaskSlot {
        match mode {
            MaskMode::EventMask => &mut self.event,
            MaskMode::CaptureMask => &mut self.capture,
        }
    }

    /// The active mode's selection and history
    pub(crate) fn active_mut(&mut self) -> &mut MaskSlot {
        self.slot_mut(self.mode)
    }

    pub fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// Selection of the active mode
    pub fn selection(&self) -> &SelectionState {
        &self.slot(self.mode).selection
    }

    pub fn selection_for(&self, mode: MaskMode) -> &SelectionState {
        &self.slot(mode).selection
    }

    pub fn diagnostics(&self) -> &DiagnosticsReport {
        &self.diagnostics
    }

    pub fn structural_diagnostics(&self) -> &DiagnosticsReport {
        &self.structural
    }

    pub fn mode(&self) -> MaskMode {
        self.mode
    }

    /// Switches the active mask; both selections are kept
    pub fn set_mode(&mut self, mode: MaskMode) -> DiagnosticsReport {
        self.mode = mode;
        self.revalidate()
    }

    /// Register words of the active mode
    pub fn mask_words(&self) -> Vec<MaskWord> {
        mask_words(self.selection())
    }

    pub fn mask_words_for(&self, mode: MaskMode) -> Vec<MaskWord> {
        mask_words(self.selection_for(mode))
    }

    /// History of the active mode
    pub fn history(&self) -> &CommandEngine {
        &self.slot(self.mode).history
    }

    pub fn history_for(&self, mode: MaskMode) -> &CommandEngine {
        &self.slot(mode).history
    }

    pub fn can_undo(&self) -> bool {
        self.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history().can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history().undo_description(&self.model)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history().redo_description(&self.model)
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.selection().snapshot()
    }
}
