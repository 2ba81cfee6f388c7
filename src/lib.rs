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

//! Event Mask Selector
//!
//! Selection engine for hardware event and capture masks described in the
//! mk1 and mk2 YAML definition formats.
//!
//! # Features
//!
//! - **Two formats:** Flat mk1 registers and mk2 registers with nested groups
//! - **Tri-state selection:** Leaf fields are set or unset, groups derive
//!   Unset/Set/Mixed from their leaves
//! - **Undo/redo:** Every selection change is recorded; group changes undo
//!   as one unit
//! - **Two masks:** Event and capture masks are separate selections, each
//!   with its own history
//! - **Mask files:** `<ID2> <VALUE8>` and `<ADDR8> <VALUE8>` text files can
//!   be exported and imported back
//! - **Validation:** Structural and semantic diagnostics with Error, Warning
//!   and Info severities; errors block export
//! - **Atomic exports:** Output files are written via temp-file-then-rename
//!
//! # Architecture
//!
//! - **`core`:** Schema model, selection, command history, validation
//! - **`format`:** mk1/mk2 document strategies, format detection, mask files
//! - **`facade`:** Session lifecycle used by the CLI and other callers
//! - **`config`:** Engine settings and atomic file writes
//! - **`logging`:** `tracing` subscriber setup for the binary
//!
//! # Examples
//!
//! ## Loading a definition and selecting a group
//!
//! ```
//! use event_mask_selector::core::{BitState, Command, TriState};
//! use event_mask_selector::facade::Facade;
//!
//! let yaml = br#"
//! format: mk2
//! registers:
//!   - id: ctrl
//!     groups:
//!       - { id: dma, span: "0-3" }
//!     fields:
//!       - { id: rx, bits: "0-1", group: dma }
//!       - { id: tx, bits: "2-3", group: dma }
//! "#;
//!
//! let facade = Facade::default();
//! let mut session = facade.load(yaml)?;
//!
//! facade.select(&mut session, &Command::set_leaf("rx", BitState::Set))?;
//! assert_eq!(session.selection().derived_state("dma")?, TriState::Mixed);
//!
//! facade.select(&mut session, &Command::set_group("dma", BitState::Set))?;
//! assert_eq!(session.selection().derived_state("dma")?, TriState::Set);
//!
//! facade.undo(&mut session);
//! assert_eq!(session.selection().derived_state("dma")?, TriState::Mixed);
//! # Ok::<(), event_mask_selector::EngineError>(())
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod core;
pub mod error;
pub mod facade;
pub mod format;
pub mod logging;

// Re-export commonly used types for convenience
pub use core::{BitState, Command, FormatKind, SchemaModel, TriState};
pub use error::EngineError;
pub use facade::{Facade, Session};
