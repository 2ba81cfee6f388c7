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

//! Format module tests
//!
//! Contains test suites for the document formats:
//! - mk1 decoding, rejection and encoding
//! - mk2 decoding with nested groups, rejection and encoding
//! - Marker detection through the registry
//! - Plain-text mask files: both layouts, header, import checks
//! - Encode/decode round-trips, including generated models

#[cfg(test)]
mod mk1_tests;

pub(crate) const MK1_DOC: &str = r#"
format: mk1
sources: [cpu]
registers:
  - id: data0
    fields:
      - id: A
        label: Alpha
        offset: 0
        width: 4
        source: cpu
      - id: B
        offset: 4
        width: 4
  - id: data1
    width: 16
    fields:
      - id: C
        offset: 0
        deprecated: true
        description: Legacy interrupt
"#;

pub(crate) const MK2_DOC: &str = r#"
format: mk2
base_address: "0x40000000"
registers:
  - id: ctrl
    groups:
      - id: dma
        label: DMA
        span: "0-7"
      - id: dma.rx
        span: "0-1"
        parent: dma
        exclusive: true
    fields:
      - { id: rx_done, bits: 0, group: dma.rx }
      - { id: rx_err, bits: "1", group: dma.rx }
      - { id: tx, bits: "4-7", group: dma }
      - { id: irq, bits: 8, deprecated: true }
  - id: status
    fields:
      - { id: busy, bits: "0-1" }
"#;
