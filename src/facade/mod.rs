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

//! src/facade/mod.rs
//!
//! Single entry point for callers (CLI, GUI, persistence)
//!
//! # Responsibilities
//!
//! - Detect and decode definition documents
//! - Open sessions with structural diagnostics and an initial selection
//! - Apply, undo and redo selection commands on the active mask mode,
//!   re-validating after each
//! - Import and export plain-text mask files
//! - Gate export on Error-level diagnostics
//!
//! # Architecture
//!
//! The facade holds only the format registry and settings. All per-file
//! state lives in a [`Session`] that callers pass in explicitly.
//!
//! # Example
//!
//! ```
//! use event_mask_selector::core::{BitState, Command};
//! use event_mask_selector::facade::Facade;
//!
//! let yaml = b"format: mk1
//! registers:
//!   - id: data0
//!     fields:
//!       - { id: A, offset: 0, width: 4 }
//!       - { id: B, offset: 4, width: 4 }
//! ";
//!
//! let facade = Facade::default();
//! let mut session = facade.load(yaml)?;
//! let report = facade.select(&mut session, &Command::set_leaf("A", BitState::Set))?;
//! assert!(report.is_empty());
//!
//! let exported = facade.export_selection(&session)?;
//! assert!(String::from_utf8_lossy(&exported).contains("selected:"));
//! # Ok::<(), event_mask_selector::EngineError>(())
//! ```

pub mod session;

pub use session::Session;

use session::MaskSlot;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::command::Command;
use crate::core::mask::selection_from_words;
use crate::core::schema::SchemaModel;
use crate::core::selection::SelectionSnapshot;
use crate::core::validator::DiagnosticsReport;
use crate::error::EngineError;
use crate::format::masks::{read_masks, write_masks};
use crate::format::{FormatRegistry, MaskEntry, SelectionBlock};

/// Orchestrates load, select, validate and export over sessions
#[derive(Debug, Default)]
pub struct Facade {
    registry: FormatRegistry,
    config: EngineConfig,
}

impl Facade {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(FormatRegistry::default(), config)
    }

    pub fn with_registry(registry: FormatRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Decodes a document into a fresh session
    ///
    /// An embedded selection block picks the active mask mode and is
    /// recorded as one undoable "Restore selection" entry in that mode's
    /// history. Structural warnings are kept in the session's diagnostics.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for a missing or unknown `format:` marker
    /// - `Parse` for malformed or structurally invalid documents
    pub fn load(&self, bytes: &[u8]) -> Result<Session, EngineError> {
        let decoded = self.registry.decode(bytes)?;
        let mut session = self.open_shared(Arc::new(decoded.model));

        if let Some(block) = decoded.selection {
            session.mode = block.mode;
            let snapshot = SelectionSnapshot::from_selected(block.selected);
            self.select(&mut session, &Command::restore(snapshot))?;
        }

        info!(
            "Loaded {} definition: {} register(s), {} field(s), {} group(s)",
            session.model.format(),
            session.model.list_registers().len(),
            session.model.fields().len(),
            session.model.groups().len()
        );
        Ok(session)
    }

    /// Opens a session over a model built in code
    ///
    /// Unlike `load`, structurally invalid models are accepted; their errors
    /// show up in the diagnostics and block export.
    pub fn open(&self, model: SchemaModel) -> Session {
        self.open_shared(Arc::new(model))
    }

    fn open_shared(&self, model: Arc<SchemaModel>) -> Session {
        let validator = self.config.validator(model.format());
        Session::new(model, validator, self.config.mask_mode)
    }

    /// Applies a command to the active mode and returns the refreshed
    /// diagnostics
    pub fn select(
        &self,
        session: &mut Session,
        command: &Command,
    ) -> Result<DiagnosticsReport, EngineError> {
        let MaskSlot { selection, history } = session.active_mut();
        history.apply(selection, command)?;
        Ok(session.revalidate())
    }

    /// Undoes the active mode's last entry (if any) and returns the
    /// refreshed diagnostics
    pub fn undo(&self, session: &mut Session) -> DiagnosticsReport {
        let MaskSlot { selection, history } = session.active_mut();
        if !history.undo(selection) {
            debug!("Nothing to undo");
        }
        session.revalidate()
    }

    /// Redoes the active mode's last undone entry (if any) and returns the
    /// refreshed diagnostics
    pub fn redo(&self, session: &mut Session) -> DiagnosticsReport {
        let MaskSlot { selection, history } = session.active_mut();
        if !history.redo(selection) {
            debug!("Nothing to redo");
        }
        session.revalidate()
    }

    /// Full validation of the active mode as it stands
    pub fn validate(&self, session: &Session) -> DiagnosticsReport {
        session.validator.full(&session.model, session.selection())
    }

    /// Replaces the active selection wholesale
    ///
    /// The replacement is one undoable "Restore selection" entry; an
    /// identical snapshot records nothing.
    pub fn restore_snapshot(
        &self,
        session: &mut Session,
        snapshot: &SelectionSnapshot,
    ) -> Result<DiagnosticsReport, EngineError> {
        self.select(session, &Command::restore(snapshot.clone()))
    }

    /// Replaces a mask's selection with the words of a mask file
    ///
    /// The file's header or addresses pick the mode; otherwise the active
    /// mode is used. The imported mode becomes active and the change is one
    /// undoable entry. Returns the import findings followed by the refreshed
    /// diagnostics.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed files or ids the format cannot hold. The
    /// session is left untouched.
    pub fn import_masks(
        &self,
        session: &mut Session,
        bytes: &[u8],
    ) -> Result<DiagnosticsReport, EngineError> {
        let import = read_masks(&session.model, bytes)?;
        let (snapshot, mapping) = selection_from_words(&session.model, &import.words);

        session.mode = import.mode.unwrap_or(session.mode);
        self.select(session, &Command::restore(snapshot))?;

        let mut report = import.report;
        report.merge(mapping);
        info!(
            "Imported {} mask ({} warning(s)): {} field(s) selected",
            session.mode,
            report.warning_count(),
            session.selection().selected_count()
        );
        report.merge(session.diagnostics.clone());
        Ok(report)
    }

    /// Renders the active mode's register words as a mask file
    ///
    /// # Errors
    ///
    /// Returns `ExportBlocked` under the same conditions as
    /// [`export_selection`](Self::export_selection).
    pub fn export_masks(&self, session: &Session) -> Result<String, EngineError> {
        self.check_exportable(session)?;
        Ok(write_masks(&session.model, &session.mask_words(), session.mode))
    }

    /// Encodes the model with the active mode's selection embedded
    ///
    /// # Errors
    ///
    /// Returns `ExportBlocked` while any Error-level diagnostic, structural
    /// or semantic, is outstanding.
    pub fn export_selection(&self, session: &Session) -> Result<Vec<u8>, EngineError> {
        self.check_exportable(session)?;

        let masks = if self.config.include_masks {
            session
                .mask_words()
                .into_iter()
                .map(|word| MaskEntry {
                    register: word.register,
                    value: format!("0x{:08X}", word.value),
                })
                .collect()
        } else {
            Vec::new()
        };

        let block = SelectionBlock {
            mode: session.mode,
            exported_at: Some(Utc::now().to_rfc3339()),
            selected: session
                .selection()
                .selected_ids()
                .into_iter()
                .map(str::to_string)
                .collect(),
            masks,
        };

        debug!("Exporting {} selected field(s)", block.selected.len());
        self.registry.encode(&session.model, Some(&block))
    }

    /// Encodes a model without any selection
    pub fn encode_model(&self, model: &SchemaModel) -> Result<Vec<u8>, EngineError> {
        self.registry.encode(model, None)
    }

    fn check_exportable(&self, session: &Session) -> Result<(), EngineError> {
        let report = self.validate(session);
        if report.has_errors() {
            warn!(
                "Export blocked by {} error diagnostic(s)",
                report.error_count()
            );
            return Err(EngineError::ExportBlocked {
                errors: report.error_count(),
                report,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
