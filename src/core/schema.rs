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

//! src/core/schema.rs
//!
//! Format-neutral schema model of an event mask definition
//!
//! The model stores registers, fields and groups in flat arenas owned by
//! [`SchemaModel`] and links them with index handles. An identifier index is
//! built once at construction, so every lookup by id is O(1) average case.
//!
//! # Construction
//! Models are only built through [`SchemaBuilder`]. The builder resolves
//! parent references and refuses anything that would corrupt the arena
//! (unknown parents, cross-register parents, cycles). Everything else
//! (duplicates, overlaps, coverage, widths) is admitted so the model stays
//! displayable; the structural validator reports those problems.

use std::collections::HashMap;
use thiserror::Error;

use crate::core::types::{
    BitRange, Field, FieldAttrs, FieldIdx, FormatKind, Group, GroupIdx, NodeRef, Register,
    RegisterIdx,
};
use crate::error::EngineError;

/// Hierarchy defects that prevent a model from being built at all
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("'{node}' references unknown group '{parent}'")]
    UnknownParent { node: String, parent: String },

    #[error("'{node}' references group '{parent}' declared in another register")]
    CrossRegister { node: String, parent: String },

    #[error("Group '{group}' has a cyclic parent chain")]
    CyclicGroup { group: String },
}

/// Declaration of a leaf field, before parent references are resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub id: String,
    pub label: String,
    pub range: BitRange,
    pub group: Option<String>,
    pub attrs: FieldAttrs,
}

impl FieldDecl {
    /// Field labelled with its own identifier
    pub fn new(id: impl Into<String>, range: BitRange) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            range,
            group: None,
            attrs: FieldAttrs::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attrs.deprecated = true;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.attrs.source = Some(source.into());
        self
    }
}

/// Declaration of a group, before parent references are resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDecl {
    pub id: String,
    pub label: String,
    pub span: BitRange,
    pub parent: Option<String>,
    pub exclusive: bool,
}

impl GroupDecl {
    pub fn new(id: impl Into<String>, span: BitRange) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            span,
            parent: None,
            exclusive: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// Incremental constructor for [`SchemaModel`]
///
/// # Example
/// ```
/// use event_mask_selector::core::schema::{FieldDecl, SchemaBuilder};
/// use event_mask_selector::core::types::{BitRange, FormatKind};
///
/// let mut builder = SchemaBuilder::new(FormatKind::Mk1);
/// let data = builder.register("data0", 32);
/// builder.field(data, FieldDecl::new("A", BitRange::new(0, 4)));
/// builder.field(data, FieldDecl::new("B", BitRange::new(4, 4)));
///
/// let model = builder.build()?;
/// assert_eq!(model.find_field("B")?.range.offset, 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    format: FormatKind,
    sources: Vec<String>,
    base_address: Option<u32>,
    registers: Vec<(String, u32)>,
    fields: Vec<(RegisterIdx, FieldDecl)>,
    groups: Vec<(RegisterIdx, GroupDecl)>,
}

impl SchemaBuilder {
    pub fn new(format: FormatKind) -> Self {
        Self {
            format,
            sources: Vec::new(),
            base_address: None,
            registers: Vec::new(),
            fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Declares the event sources fields may reference
    pub fn sources(&mut self, sources: Vec<String>) -> &mut Self {
        self.sources = sources;
        self
    }

    pub fn base_address(&mut self, base_address: Option<u32>) -> &mut Self {
        self.base_address = base_address;
        self
    }

    /// Appends a register and returns its handle
    pub fn register(&mut self, id: impl Into<String>, width: u32) -> RegisterIdx {
        self.registers.push((id.into(), width));
        RegisterIdx(self.registers.len() - 1)
    }

    pub fn field(&mut self, register: RegisterIdx, decl: FieldDecl) -> &mut Self {
        self.fields.push((register, decl));
        self
    }

    pub fn group(&mut self, register: RegisterIdx, decl: GroupDecl) -> &mut Self {
        self.groups.push((register, decl));
        self
    }

    /// Resolves parent references and freezes the arenas
    ///
    /// Arenas are stored register by register, keeping declaration order
    /// within each register, so a model decoded from its own encoding
    /// compares equal to the original.
    pub fn build(mut self) -> Result<SchemaModel, SchemaError> {
        self.groups.sort_by_key(|(register, _)| *register);
        self.fields.sort_by_key(|(register, _)| *register);

        // First declaration wins; duplicates are left for the validator
        let mut group_lookup: HashMap<&str, usize> = HashMap::new();
        for (i, (_, decl)) in self.groups.iter().enumerate() {
            group_lookup.entry(decl.id.as_str()).or_insert(i);
        }

        let resolve_parent = |node: &str, register: RegisterIdx, parent: &Option<String>| {
            let Some(parent) = parent else {
                return Ok(None);
            };
            let idx = *group_lookup
                .get(parent.as_str())
                .ok_or_else(|| SchemaError::UnknownParent {
                    node: node.to_string(),
                    parent: parent.clone(),
                })?;
            if self.groups[idx].0 != register {
                return Err(SchemaError::CrossRegister {
                    node: node.to_string(),
                    parent: parent.clone(),
                });
            }
            Ok(Some(GroupIdx(idx)))
        };

        let mut groups = Vec::with_capacity(self.groups.len());
        for (register, decl) in &self.groups {
            groups.push(Group {
                id: decl.id.clone(),
                label: decl.label.clone(),
                register: *register,
                span: decl.span,
                parent: resolve_parent(&decl.id, *register, &decl.parent)?,
                exclusive: decl.exclusive,
                children: Vec::new(),
            });
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for (register, decl) in &self.fields {
            fields.push(Field {
                id: decl.id.clone(),
                label: decl.label.clone(),
                register: *register,
                range: decl.range,
                parent: resolve_parent(&decl.id, *register, &decl.group)?,
                attrs: decl.attrs.clone(),
            });
        }

        detect_cycles(&groups)?;

        for i in 0..groups.len() {
            if let Some(GroupIdx(parent)) = groups[i].parent {
                groups[parent].children.push(NodeRef::Group(GroupIdx(i)));
            }
        }
        for (i, field) in fields.iter().enumerate() {
            if let Some(GroupIdx(parent)) = field.parent {
                groups[parent].children.push(NodeRef::Field(FieldIdx(i)));
            }
        }

        let mut registers: Vec<Register> = self
            .registers
            .into_iter()
            .map(|(id, width)| Register {
                id,
                width,
                fields: Vec::new(),
                groups: Vec::new(),
            })
            .collect();
        for (i, group) in groups.iter().enumerate() {
            registers[group.register.0].groups.push(GroupIdx(i));
        }
        for (i, field) in fields.iter().enumerate() {
            registers[field.register.0].fields.push(FieldIdx(i));
        }

        let mut index = HashMap::with_capacity(groups.len() + fields.len());
        for (i, group) in groups.iter().enumerate() {
            index
                .entry(group.id.clone())
                .or_insert(NodeRef::Group(GroupIdx(i)));
        }
        for (i, field) in fields.iter().enumerate() {
            index
                .entry(field.id.clone())
                .or_insert(NodeRef::Field(FieldIdx(i)));
        }

        let mut register_index = HashMap::with_capacity(registers.len());
        for (i, register) in registers.iter().enumerate() {
            register_index
                .entry(register.id.clone())
                .or_insert(RegisterIdx(i));
        }

        Ok(SchemaModel {
            format: self.format,
            sources: self.sources,
            base_address: self.base_address,
            registers,
            fields,
            groups,
            index,
            register_index,
        })
    }
}

/// Fails on the first group (in declaration order) whose parent chain loops
fn detect_cycles(groups: &[Group]) -> Result<(), SchemaError> {
    for (i, group) in groups.iter().enumerate() {
        let mut current = group.parent;
        let mut steps = 0;
        while let Some(GroupIdx(parent)) = current {
            if parent == i || steps > groups.len() {
                return Err(SchemaError::CyclicGroup {
                    group: group.id.clone(),
                });
            }
            steps += 1;
            current = groups[parent].parent;
        }
    }
    Ok(())
}

/// Immutable, indexed event mask definition
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaModel {
    format: FormatKind,
    sources: Vec<String>,
    base_address: Option<u32>,
    registers: Vec<Register>,
    fields: Vec<Field>,
    groups: Vec<Group>,
    index: HashMap<String, NodeRef>,
    register_index: HashMap<String, RegisterIdx>,
}

impl SchemaModel {
    pub fn format(&self) -> FormatKind {
        self.format
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// mk2 register block base address, if declared
    pub fn base_address(&self) -> Option<u32> {
        self.base_address
    }

    pub fn list_registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn leaf_count(&self) -> usize {
        self.fields.len()
    }

    pub fn register(&self, idx: RegisterIdx) -> &Register {
        &self.registers[idx.0]
    }

    pub fn field(&self, idx: FieldIdx) -> &Field {
        &self.fields[idx.0]
    }

    pub fn group(&self, idx: GroupIdx) -> &Group {
        &self.groups[idx.0]
    }

    /// Resolves a field or group identifier
    pub fn resolve(&self, id: &str) -> Result<NodeRef, EngineError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::not_found(id))
    }

    pub fn field_idx(&self, id: &str) -> Result<FieldIdx, EngineError> {
        match self.resolve(id)? {
            NodeRef::Field(idx) => Ok(idx),
            NodeRef::Group(_) => Err(EngineError::not_found(id)),
        }
    }

    pub fn group_idx(&self, id: &str) -> Result<GroupIdx, EngineError> {
        match self.resolve(id)? {
            NodeRef::Group(idx) => Ok(idx),
            NodeRef::Field(_) => Err(EngineError::not_found(id)),
        }
    }

    pub fn register_idx(&self, id: &str) -> Result<RegisterIdx, EngineError> {
        self.register_index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::not_found(id))
    }

    pub fn find_register(&self, id: &str) -> Result<&Register, EngineError> {
        Ok(self.register(self.register_idx(id)?))
    }

    pub fn find_field(&self, id: &str) -> Result<&Field, EngineError> {
        Ok(self.field(self.field_idx(id)?))
    }

    pub fn find_group(&self, id: &str) -> Result<&Group, EngineError> {
        Ok(self.group(self.group_idx(id)?))
    }

    /// Direct children of a group, child groups first
    pub fn children(&self, group_id: &str) -> Result<&[NodeRef], EngineError> {
        Ok(&self.find_group(group_id)?.children)
    }

    /// Enclosing groups of a field or group, nearest first
    pub fn ancestors(&self, id: &str) -> Result<Vec<&Group>, EngineError> {
        let mut current = self.node_parent(self.resolve(id)?);
        let mut chain = Vec::new();
        while let Some(idx) = current {
            let group = self.group(idx);
            chain.push(group);
            current = group.parent;
        }
        Ok(chain)
    }

    pub fn node_id(&self, node: NodeRef) -> &str {
        match node {
            NodeRef::Field(idx) => &self.field(idx).id,
            NodeRef::Group(idx) => &self.group(idx).id,
        }
    }

    /// Bit range of a field, declared span of a group
    pub fn node_range(&self, node: NodeRef) -> BitRange {
        match node {
            NodeRef::Field(idx) => self.field(idx).range,
            NodeRef::Group(idx) => self.group(idx).span,
        }
    }

    pub fn node_parent(&self, node: NodeRef) -> Option<GroupIdx> {
        match node {
            NodeRef::Field(idx) => self.field(idx).parent,
            NodeRef::Group(idx) => self.group(idx).parent,
        }
    }

    /// Nodes of a register that have no enclosing group, groups first
    pub fn top_level(&self, register: RegisterIdx) -> Vec<NodeRef> {
        let register = self.register(register);
        let groups = register
            .groups
            .iter()
            .filter(|g| self.group(**g).parent.is_none())
            .map(|g| NodeRef::Group(*g));
        let fields = register
            .fields
            .iter()
            .filter(|f| self.field(**f).parent.is_none())
            .map(|f| NodeRef::Field(*f));
        groups.chain(fields).collect()
    }

    /// Every leaf below a group, in depth-first child order
    pub fn group_leaves(&self, group: GroupIdx) -> Vec<FieldIdx> {
        let mut leaves = Vec::new();
        let mut stack: Vec<NodeRef> = self.group(group).children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            match node {
                NodeRef::Field(idx) => leaves.push(idx),
                NodeRef::Group(idx) => stack.extend(self.group(idx).children.iter().rev()),
            }
        }
        leaves
    }

    pub fn register_leaves(&self, register: RegisterIdx) -> &[FieldIdx] {
        &self.register(register).fields
    }

    /// Union of the bit ranges of every leaf below a group
    ///
    /// `None` for a group without leaves.
    pub fn effective_span(&self, group: GroupIdx) -> Option<BitRange> {
        self.group_leaves(group)
            .into_iter()
            .map(|f| self.field(f).range)
            .reduce(|acc, range| acc.union(&range))
    }
}
