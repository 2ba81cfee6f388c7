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

//! src/core/validator.rs
//!
//! Structural and semantic validation of event mask definitions
//!
//! Two phases, independently invocable:
//! - **Structural** (`Validator::structural`): the model alone. Identifier
//!   uniqueness, register limits, range placement, sibling overlap and group
//!   span coverage.
//! - **Semantic** (`Validator::semantic`): the model plus a selection.
//!   Exclusive groups, deprecated fields and unresolved (Mixed) groups.
//!
//! Findings are collected into a [`DiagnosticsReport`]. The report is data,
//! not an error: callers decide what blocks. The facade refuses to export
//! while `has_errors()` is true.
//!
//! Both phases are pure and deterministic. Rules run in a fixed order over
//! the arenas in declaration order, so identical inputs give identical
//! reports.
//!
//! # Example
//! ```
//! use event_mask_selector::core::schema::{FieldDecl, SchemaBuilder};
//! use event_mask_selector::core::types::{BitRange, FormatKind};
//! use event_mask_selector::core::validator::Validator;
//!
//! let mut builder = SchemaBuilder::new(FormatKind::Mk1);
//! let reg = builder.register("data0", 32);
//! builder.field(reg, FieldDecl::new("A", BitRange::new(0, 4)));
//! builder.field(reg, FieldDecl::new("B", BitRange::new(2, 4)));
//! let model = builder.build()?;
//!
//! let report = Validator::for_format(FormatKind::Mk1, None).structural(&model);
//! assert!(report.has_errors(), "A and B overlap");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::core::schema::SchemaModel;
use crate::core::selection::SelectionState;
use crate::core::types::{BitRange, FieldIdx, FormatKind, GroupIdx, NodeRef, RegisterIdx, TriState};

/// Diagnostic severity
///
/// - **Error**: Blocks export
/// - **Warning**: Export allowed, user should look
/// - **Info**: Advisory only
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Stable machine-readable identifier of a validation rule
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DiagnosticCode {
    DuplicateId,
    DuplicateRegister,
    RegisterWidth,
    TooManyRegisters,
    ZeroWidth,
    OutOfRegister,
    ReservedBits,
    Overlap,
    SpanCoverage,
    GroupsUnsupported,
    EmptyGroup,
    UndeclaredSource,
    UnalignedBaseAddress,
    LooseSpan,
    ExclusiveConflict,
    DeprecatedSelected,
    MixedGroup,
    UndeclaredRegister,
    PartialField,
    UnmappedBits,
    GuessedBaseAddress,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::DuplicateId => "DUPLICATE_ID",
            DiagnosticCode::DuplicateRegister => "DUPLICATE_REGISTER",
            DiagnosticCode::RegisterWidth => "REGISTER_WIDTH",
            DiagnosticCode::TooManyRegisters => "TOO_MANY_REGISTERS",
            DiagnosticCode::ZeroWidth => "ZERO_WIDTH",
            DiagnosticCode::OutOfRegister => "OUT_OF_REGISTER",
            DiagnosticCode::ReservedBits => "RESERVED_BITS",
            DiagnosticCode::Overlap => "OVERLAP",
            DiagnosticCode::SpanCoverage => "SPAN_COVERAGE",
            DiagnosticCode::GroupsUnsupported => "GROUPS_UNSUPPORTED",
            DiagnosticCode::EmptyGroup => "EMPTY_GROUP",
            DiagnosticCode::UndeclaredSource => "UNDECLARED_SOURCE",
            DiagnosticCode::UnalignedBaseAddress => "UNALIGNED_BASE_ADDRESS",
            DiagnosticCode::LooseSpan => "LOOSE_SPAN",
            DiagnosticCode::ExclusiveConflict => "EXCLUSIVE_CONFLICT",
            DiagnosticCode::DeprecatedSelected => "DEPRECATED_SELECTED",
            DiagnosticCode::MixedGroup => "MIXED_GROUP",
            DiagnosticCode::UndeclaredRegister => "UNDECLARED_REGISTER",
            DiagnosticCode::PartialField => "PARTIAL_FIELD",
            DiagnosticCode::UnmappedBits => "UNMAPPED_BITS",
            DiagnosticCode::GuessedBaseAddress => "GUESSED_BASE_ADDRESS",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Field, group or register id the finding is attached to
    pub location: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "[{}] {} at {}: {}",
                self.severity, self.code, location, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// Ordered collection of diagnostics produced by one validation run
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiagnosticsReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the report contains any Error-level diagnostic
    ///
    /// Error-level diagnostics block export.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// First Error-level diagnostic, if any
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
    }

    /// Appends every diagnostic of `other`, keeping order
    pub fn merge(&mut self, other: DiagnosticsReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, code: DiagnosticCode, location: Option<&str>, message: String) {
        self.add(Severity::Error, code, location, message);
    }

    pub fn add_warning(&mut self, code: DiagnosticCode, location: Option<&str>, message: String) {
        self.add(Severity::Warning, code, location, message);
    }

    pub fn add_info(&mut self, code: DiagnosticCode, location: Option<&str>, message: String) {
        self.add(Severity::Info, code, location, message);
    }

    fn add(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        location: Option<&str>,
        message: String,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            code,
            location: location.map(str::to_string),
            message,
        });
    }
}

impl<'a> IntoIterator for &'a DiagnosticsReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// How a group left in the Mixed state is reported by semantic validation
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MixedGroupPolicy {
    Allow,
    Warn,
    Error,
}

impl MixedGroupPolicy {
    /// Default for a schema generation: mk2 warns, mk1 has no groups to judge
    pub fn default_for(format: FormatKind) -> Self {
        match format {
            FormatKind::Mk1 => MixedGroupPolicy::Allow,
            FormatKind::Mk2 => MixedGroupPolicy::Warn,
        }
    }
}

impl fmt::Display for MixedGroupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixedGroupPolicy::Allow => write!(f, "allow"),
            MixedGroupPolicy::Warn => write!(f, "warn"),
            MixedGroupPolicy::Error => write!(f, "error"),
        }
    }
}

/// Rule runner for both validation phases
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Validator {
    mixed_groups: MixedGroupPolicy,
}

impl Validator {
    pub fn new(mixed_groups: MixedGroupPolicy) -> Self {
        Self { mixed_groups }
    }

    /// Validator using the format's default Mixed policy unless overridden
    pub fn for_format(format: FormatKind, mixed_groups: Option<MixedGroupPolicy>) -> Self {
        Self::new(mixed_groups.unwrap_or_else(|| MixedGroupPolicy::default_for(format)))
    }

    pub fn mixed_groups(&self) -> MixedGroupPolicy {
        self.mixed_groups
    }

    /// Checks the model alone
    pub fn structural(&self, model: &SchemaModel) -> DiagnosticsReport {
        let mut report = DiagnosticsReport::new();

        check_model_limits(model, &mut report);
        check_registers(model, &mut report);
        check_identifiers(model, &mut report);
        check_fields(model, &mut report);
        check_groups(model, &mut report);
        check_overlaps(model, &mut report);

        debug!(
            "Structural validation: {} diagnostic(s), {} error(s)",
            report.len(),
            report.error_count()
        );
        report
    }

    /// Checks a selection against the model it was made for
    pub fn semantic(&self, model: &SchemaModel, selection: &SelectionState) -> DiagnosticsReport {
        let mut report = DiagnosticsReport::new();

        for (i, group) in model.groups().iter().enumerate() {
            let node = NodeRef::Group(GroupIdx(i));

            if group.exclusive {
                let active: Vec<&str> = group
                    .children
                    .iter()
                    .filter(|child| selection.node_state(**child) != TriState::Unset)
                    .map(|child| model.node_id(*child))
                    .collect();
                if active.len() > 1 {
                    report.add_error(
                        DiagnosticCode::ExclusiveConflict,
                        Some(&group.id),
                        format!(
                            "Exclusive group allows one selection, found {}: {}",
                            active.len(),
                            active.join(", ")
                        ),
                    );
                }
            }

            if selection.node_state(node) == TriState::Mixed {
                let message = "Group is partially selected".to_string();
                match self.mixed_groups {
                    MixedGroupPolicy::Allow => {}
                    MixedGroupPolicy::Warn => {
                        report.add_warning(DiagnosticCode::MixedGroup, Some(&group.id), message)
                    }
                    MixedGroupPolicy::Error => {
                        report.add_error(DiagnosticCode::MixedGroup, Some(&group.id), message)
                    }
                }
            }
        }

        for (i, field) in model.fields().iter().enumerate() {
            let state = selection.node_state(NodeRef::Field(FieldIdx(i)));
            if field.attrs.deprecated && state == TriState::Set {
                report.add_warning(
                    DiagnosticCode::DeprecatedSelected,
                    Some(&field.id),
                    "Deprecated event is selected".to_string(),
                );
            }
        }

        debug!(
            "Semantic validation: {} diagnostic(s), {} error(s)",
            report.len(),
            report.error_count()
        );
        report
    }

    /// Structural diagnostics followed by semantic diagnostics
    pub fn full(&self, model: &SchemaModel, selection: &SelectionState) -> DiagnosticsReport {
        let mut report = self.structural(model);
        report.merge(self.semantic(model, selection));
        report
    }
}

fn check_model_limits(model: &SchemaModel, report: &mut DiagnosticsReport) {
    let format = model.format();
    let count = model.list_registers().len();
    if count > format.max_registers() {
        report.add_error(
            DiagnosticCode::TooManyRegisters,
            None,
            format!(
                "{} definitions allow at most {} registers, found {}",
                format,
                format.max_registers(),
                count
            ),
        );
    }

    if let Some(base) = model.base_address() {
        if base % 4 != 0 {
            report.add_warning(
                DiagnosticCode::UnalignedBaseAddress,
                None,
                format!("Base address 0x{base:08X} is not 4-byte aligned"),
            );
        }
    }
}

fn check_registers(model: &SchemaModel, report: &mut DiagnosticsReport) {
    let mut seen = HashSet::new();
    for register in model.list_registers() {
        if !seen.insert(register.id.as_str()) {
            report.add_error(
                DiagnosticCode::DuplicateRegister,
                Some(&register.id),
                "Register id is declared more than once".to_string(),
            );
        }
        if !(1..=32).contains(&register.width) {
            report.add_error(
                DiagnosticCode::RegisterWidth,
                Some(&register.id),
                format!("Register width {} is outside 1-32", register.width),
            );
        }
    }
}

fn check_identifiers(model: &SchemaModel, report: &mut DiagnosticsReport) {
    let mut seen = HashSet::new();
    let ids = model
        .groups()
        .iter()
        .map(|g| g.id.as_str())
        .chain(model.fields().iter().map(|f| f.id.as_str()));
    for id in ids {
        if !seen.insert(id) {
            report.add_error(
                DiagnosticCode::DuplicateId,
                Some(id),
                "Identifier is declared more than once".to_string(),
            );
        }
    }
}

/// Placement rules shared by field ranges and group spans
fn check_placement(
    model: &SchemaModel,
    id: &str,
    range: BitRange,
    register_width: u32,
    report: &mut DiagnosticsReport,
) {
    if range.is_empty() {
        report.add_error(
            DiagnosticCode::ZeroWidth,
            Some(id),
            "Bit range has zero width".to_string(),
        );
    } else if range.end() > u64::from(register_width) {
        report.add_error(
            DiagnosticCode::OutOfRegister,
            Some(id),
            format!("Range {range} exceeds the {register_width}-bit register"),
        );
    } else if range.mask() & !model.format().usable_bits() != 0 {
        report.add_error(
            DiagnosticCode::ReservedBits,
            Some(id),
            format!("Range {range} uses reserved bits 28-31"),
        );
    }
}

fn check_fields(model: &SchemaModel, report: &mut DiagnosticsReport) {
    for field in model.fields() {
        let width = model.register(field.register).width;
        check_placement(model, &field.id, field.range, width, report);

        if let Some(source) = &field.attrs.source {
            if !model.sources().iter().any(|s| s == source) {
                report.add_warning(
                    DiagnosticCode::UndeclaredSource,
                    Some(&field.id),
                    format!("Event source '{source}' is not declared"),
                );
            }
        }
    }
}

fn check_groups(model: &SchemaModel, report: &mut DiagnosticsReport) {
    let format = model.format();
    for group in model.groups() {
        if !format.supports_groups() {
            report.add_error(
                DiagnosticCode::GroupsUnsupported,
                Some(&group.id),
                format!("{format} definitions cannot declare groups"),
            );
            continue;
        }

        let width = model.register(group.register).width;
        check_placement(model, &group.id, group.span, width, report);

        if group.children.is_empty() {
            report.add_warning(
                DiagnosticCode::EmptyGroup,
                Some(&group.id),
                "Group has no children".to_string(),
            );
            continue;
        }

        let mut covered = true;
        for child in &group.children {
            let range = model.node_range(*child);
            if !group.span.contains(&range) {
                covered = false;
                report.add_error(
                    DiagnosticCode::SpanCoverage,
                    Some(&group.id),
                    format!(
                        "Span {} does not cover '{}' ({})",
                        group.span,
                        model.node_id(*child),
                        range
                    ),
                );
            }
        }

        let children_span = group
            .children
            .iter()
            .map(|child| model.node_range(*child))
            .reduce(|acc, range| acc.union(&range));
        if let Some(children_span) = children_span {
            if covered && children_span != group.span {
                report.add_info(
                    DiagnosticCode::LooseSpan,
                    Some(&group.id),
                    format!(
                        "Span {} is wider than its children ({})",
                        group.span, children_span
                    ),
                );
            }
        }
    }
}

/// Pairwise overlap within each sibling scope, reported on the later node
fn check_overlaps(model: &SchemaModel, report: &mut DiagnosticsReport) {
    let mut scopes: Vec<Vec<NodeRef>> = Vec::new();
    for (i, _) in model.list_registers().iter().enumerate() {
        scopes.push(model.top_level(RegisterIdx(i)));
    }
    for group in model.groups() {
        scopes.push(group.children.clone());
    }

    for scope in &scopes {
        // Declaration order, so "later" means later in the document
        let mut ordered = scope.clone();
        ordered.sort_by_key(|node| declaration_key(*node));

        for (i, later) in ordered.iter().enumerate() {
            let later_range = model.node_range(*later);
            for earlier in &ordered[..i] {
                let earlier_range = model.node_range(*earlier);
                if later_range.overlaps(&earlier_range) {
                    report.add_error(
                        DiagnosticCode::Overlap,
                        Some(model.node_id(*later)),
                        format!(
                            "Range {} overlaps '{}' ({})",
                            later_range,
                            model.node_id(*earlier),
                            earlier_range
                        ),
                    );
                }
            }
        }
    }
}

/// Groups are declared before fields in both document layouts
fn declaration_key(node: NodeRef) -> (u8, usize) {
    match node {
        NodeRef::Group(idx) => (0, idx.index()),
        NodeRef::Field(idx) => (1, idx.index()),
    }
}
