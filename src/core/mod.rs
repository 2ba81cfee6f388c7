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

//! src/core/mod.rs
//!
//! Core business logic module
//!
//! This module contains the format-neutral domain engine:
//! - Schema model (arena + id index) and its builder
//! - Tri-state selection over the model's leaves
//! - Undo/redo history of selection commands
//! - Structural and semantic validation
//! - Register mask words
//!
//! Nothing here reads files or knows about YAML; the format layer decodes
//! documents into a `SchemaModel` and the facade ties the pieces together.

pub mod command;
pub mod mask;
pub mod schema;
pub mod selection;
pub mod types;
pub mod validator;

pub use command::{Command, CommandEngine, HistoryEntry};
pub use mask::MaskWord;
pub use schema::{FieldDecl, GroupDecl, SchemaBuilder, SchemaError, SchemaModel};
pub use selection::{LeafChange, SelectionSnapshot, SelectionState};
pub use types::*;
pub use validator::{
    Diagnostic, DiagnosticCode, DiagnosticsReport, MixedGroupPolicy, Severity, Validator,
};

#[cfg(test)]
mod tests;
