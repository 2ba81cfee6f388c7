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

//! src/core/mask.rs
//!
//! Register mask words built from a selection, and back
//!
//! Two text renderings are supported:
//! - `<ID2> <VALUE8>`: register index and word, one line per register
//! - `<ADDR8> <VALUE8>`: absolute register address and word (mk2 with a
//!   base address). The address is `base + mode offset + 4 * index`.

use crate::core::schema::SchemaModel;
use crate::core::selection::{SelectionSnapshot, SelectionState};
use crate::core::types::MaskMode;
use crate::core::validator::{DiagnosticCode, DiagnosticsReport};

/// The value of one register for the current selection
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MaskWord {
    pub index: usize,
    pub register: String,
    pub value: u32,
}

/// One word per register, in declaration order
///
/// Bits the format reserves are always cleared.
pub fn mask_words(selection: &SelectionState) -> Vec<MaskWord> {
    let model = selection.model();
    let usable = model.format().usable_bits();

    model
        .list_registers()
        .iter()
        .enumerate()
        .map(|(index, register)| {
            let value = register
                .fields
                .iter()
                .filter(|field| selection.leaf(**field).is_set())
                .fold(0u32, |word, field| word | model.field(*field).range.mask());
            MaskWord {
                index,
                register: register.id.clone(),
                value: value & usable,
            }
        })
        .collect()
}

/// Maps register words back onto leaf fields
///
/// A field is selected when every one of its bits is set. Partially set
/// fields stay unselected and bits no field covers are dropped; both are
/// reported as warnings. Words past the last register are ignored.
pub fn selection_from_words(
    model: &SchemaModel,
    words: &[u32],
) -> (SelectionSnapshot, DiagnosticsReport) {
    let mut selected = Vec::new();
    let mut report = DiagnosticsReport::new();

    for (register, word) in model.list_registers().iter().zip(words) {
        let mut covered = 0u32;
        for idx in &register.fields {
            let field = model.field(*idx);
            let mask = field.range.mask();
            covered |= mask;
            match word & mask {
                0 => {}
                bits if bits == mask => selected.push(field.id.clone()),
                bits => report.add_warning(
                    DiagnosticCode::PartialField,
                    Some(&field.id),
                    format!("Only bits {bits:08X} of {mask:08X} are set, field left unselected"),
                ),
            }
        }

        let unmapped = word & !covered;
        if unmapped != 0 {
            report.add_warning(
                DiagnosticCode::UnmappedBits,
                Some(&register.id),
                format!("Bits {unmapped:08X} belong to no field and were ignored"),
            );
        }
    }

    (SelectionSnapshot::from_selected(selected), report)
}

/// `<ID2> <VALUE8>` lines
pub fn format_indexed(words: &[MaskWord]) -> String {
    words
        .iter()
        .map(|word| format!("{:02X} {:08X}\n", word.index, word.value))
        .collect::<String>()
}

/// `<ADDR8> <VALUE8>` lines
pub fn format_addressed(words: &[MaskWord], base_address: u32, mode: MaskMode) -> String {
    words
        .iter()
        .map(|word| {
            format!(
                "{:08X} {:08X}\n",
                register_address(base_address, mode, word.index),
                word.value
            )
        })
        .collect::<String>()
}

/// Absolute address of register `index` in the given mask block
pub fn register_address(base_address: u32, mode: MaskMode, index: usize) -> u32 {
    let offset = u32::try_from(index).unwrap_or(u32::MAX).wrapping_mul(4);
    base_address
        .wrapping_add(mode.address_offset())
        .wrapping_add(offset)
}
