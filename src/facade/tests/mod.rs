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

//! Facade tests
//!
//! End-to-end session flows: load, select, undo/redo, export gating and
//! re-loading exported documents.


pub(crate) const TWO_REGISTER_MK1: &[u8] = br#"
format: mk1
registers:
  - id: data0
    fields:
      - { id: A, offset: 0, width: 4 }
      - { id: B, offset: 4, width: 4 }
  - id: data1
    fields:
      - { id: C, offset: 0 }
"#;

pub(crate) const GROUPED_MK2: &[u8] = br#"
format: mk2
base_address: "0x40000000"
registers:
  - id: ctrl
    groups:
      - { id: dma, span: "0-7" }
      - { id: dma.rx, span: "0-1", parent: dma, exclusive: true }
    fields:
      - { id: rx_done, bits: 0, group: dma.rx }
      - { id: rx_err, bits: 1, group: dma.rx }
      - { id: tx, bits: "4-7", group: dma }
      - { id: irq, bits: 8, deprecated: true }
"#;
