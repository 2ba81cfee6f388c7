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

//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Schema model lookups, traversal and builder failures
//! - Selection state and derived tri-state
//! - Command engine undo/redo laws
//! - Structural and semantic validation rules
//! - Value types (BitRange, BitState)

#[cfg(test)]
mod command_tests;
#[cfg(test)]
mod selection_tests;

use std::sync::Arc;

use crate::core::schema::{FieldDecl, GroupDecl, SchemaBuilder, SchemaModel};
use crate::core::types::{BitRange, FormatKind};

/// mk1, two registers: data0 { A: 0-3, B: 4-7 }, data1 { C: 0 }
pub(crate) fn two_register_mk1() -> SchemaModel {
    let mut builder = SchemaBuilder::new(FormatKind::Mk1);
    let data0 = builder.register("data0", 32);
    let data1 = builder.register("data1", 32);
    builder
        .field(data0, FieldDecl::new("A", BitRange::new(0, 4)))
        .field(data0, FieldDecl::new("B", BitRange::new(4, 4)))
        .field(data1, FieldDecl::new("C", BitRange::new(0, 1)));
    builder.build().unwrap()
}

/// mk2, structurally clean:
///
/// ```text
/// ctrl
///   dma [0-7]
///     dma.rx [0-1] (exclusive)
///       rx_done 0
///       rx_err  1
///     tx 4-7
///   irq 8 (deprecated)
/// ```
pub(crate) fn nested_mk2() -> SchemaModel {
    let mut builder = SchemaBuilder::new(FormatKind::Mk2);
    let ctrl = builder.register("ctrl", 32);
    builder
        .group(ctrl, GroupDecl::new("dma", BitRange::new(0, 8)).label("DMA"))
        .group(
            ctrl,
            GroupDecl::new("dma.rx", BitRange::new(0, 2))
                .parent("dma")
                .exclusive(),
        )
        .field(ctrl, FieldDecl::new("rx_done", BitRange::new(0, 1)).in_group("dma.rx"))
        .field(ctrl, FieldDecl::new("rx_err", BitRange::new(1, 1)).in_group("dma.rx"))
        .field(ctrl, FieldDecl::new("tx", BitRange::new(4, 4)).in_group("dma"))
        .field(ctrl, FieldDecl::new("irq", BitRange::new(8, 1)).deprecated());
    builder.build().unwrap()
}

/// mk2: ctrl { dma [0-1] { rx 0, tx 1 } }, status { idle [0-3] with no children }
pub(crate) fn nested_mk2_with_empty_group() -> SchemaModel {
    let mut builder = SchemaBuilder::new(FormatKind::Mk2);
    let ctrl = builder.register("ctrl", 32);
    let status = builder.register("status", 32);
    builder
        .group(ctrl, GroupDecl::new("dma", BitRange::new(0, 2)))
        .field(ctrl, FieldDecl::new("rx", BitRange::new(0, 1)).in_group("dma"))
        .field(ctrl, FieldDecl::new("tx", BitRange::new(1, 1)).in_group("dma"))
        .group(status, GroupDecl::new("idle", BitRange::new(0, 4)));
    builder.build().unwrap()
}

pub(crate) fn shared(model: SchemaModel) -> Arc<SchemaModel> {
    Arc::new(model)
}
