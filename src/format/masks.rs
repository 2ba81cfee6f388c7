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

//! src/format/masks.rs
//!
//! Plain-text mask files
//!
//! One register word per line, in one of two layouts:
//! - `<ID2> <VALUE8>`: two-digit register index, then the word
//! - `<ADDR8> <VALUE8>`: absolute register address, then the word (mk2
//!   only). The address is `base + mode offset + 4 * index`.
//!
//! Lines starting with `#` are comments. Exported files open with a header
//! comment naming what they were built from:
//!
//! ```text
//! # event-selector: format=mk2, mode=event_mask, base_address=0x40000000
//! ```
//!
//! Reading checks every line against the model's format and yields one
//! word per declared register plus import diagnostics. Turning words back
//! into fields is [`selection_from_words`](crate::core::mask::selection_from_words).

use nom::{
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, hex_digit1, space0, space1},
    combinator::all_consuming,
    multi::separated_list1,
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser,
};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::core::mask::{format_addressed, format_indexed, MaskWord};
use crate::core::schema::SchemaModel;
use crate::core::types::{FormatKind, MaskMode};
use crate::core::validator::{DiagnosticCode, DiagnosticsReport};
use crate::format::bits::{format_address, parse_address};
use crate::format::ParseError;

const HEADER_TAG: &str = "event-selector:";

/// Key column of a mask file
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaskLayout {
    /// `<ID2> <VALUE8>`
    Indexed,
    /// `<ADDR8> <VALUE8>`
    Addressed,
}

/// Values carried by the `# event-selector:` header comment
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MaskHeader {
    pub format: Option<FormatKind>,
    pub mode: Option<MaskMode>,
    pub base_address: Option<u32>,
}

impl fmt::Display for MaskHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = [
            self.format.map(|format| format!("format={format}")),
            self.mode.map(|mode| format!("mode={mode}")),
            self.base_address
                .map(|base| format!("base_address={}", format_address(base))),
        ]
        .into_iter()
        .flatten()
        .collect();
        write!(f, "# {HEADER_TAG} {}", pairs.join(", "))
    }
}

/// One data line as written
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct MaskLine {
    number: usize,
    layout: MaskLayout,
    key: u32,
    value: u32,
}

/// A mask file checked against a model
#[derive(Clone, Debug, PartialEq)]
pub struct MaskImport {
    pub layout: MaskLayout,
    /// From the header, or from the addresses of an addressed file
    pub mode: Option<MaskMode>,
    /// One word per declared register, in declaration order
    pub words: Vec<u32>,
    pub report: DiagnosticsReport,
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        delimited(space0, char('='), space0),
        take_till1(|c: char| c == ',' || c.is_whitespace()),
    )
    .parse(input)
}

/// `# event-selector: key=value, key=value`
fn header_pairs(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    delimited(
        (char('#'), space0, tag(HEADER_TAG), space0),
        separated_list1(delimited(space0, char(','), space0), key_value),
        space0,
    )
    .parse(input)
}

/// `<hex> <hex>`, returning both digit runs
fn data_line(input: &str) -> IResult<&str, (&str, &str)> {
    delimited(
        space0,
        separated_pair(hex_digit1, space1, hex_digit1),
        space0,
    )
    .parse(input)
}

fn header_tag(input: &str) -> IResult<&str, &str> {
    preceded((char('#'), space0), tag(HEADER_TAG)).parse(input)
}

fn line_error(number: usize, message: impl Into<String>) -> ParseError {
    ParseError::MaskFile {
        line: Some(number),
        message: message.into(),
    }
}

fn parse_header(number: usize, line: &str) -> Result<MaskHeader, ParseError> {
    let (_, pairs) = all_consuming(header_pairs)
        .parse(line)
        .map_err(|_| line_error(number, "malformed header"))?;

    let mut header = MaskHeader::default();
    for (key, value) in pairs {
        match key {
            "format" => {
                header.format = Some(match value.to_ascii_lowercase().as_str() {
                    "mk1" => FormatKind::Mk1,
                    "mk2" => FormatKind::Mk2,
                    _ => return Err(line_error(number, format!("unknown format '{value}'"))),
                });
            }
            "mode" => {
                header.mode = Some(match value.to_ascii_lowercase().as_str() {
                    "event_mask" | "event" | "mask" => MaskMode::EventMask,
                    "capture_mask" | "capture" | "trigger" => MaskMode::CaptureMask,
                    _ => return Err(line_error(number, format!("unknown mode '{value}'"))),
                });
            }
            "base_address" => header.base_address = Some(parse_address(value)?),
            // yaml=, version=, timestamp= and friends are informational
            _ => {}
        }
    }
    Ok(header)
}

fn parse_data(number: usize, line: &str) -> Result<MaskLine, ParseError> {
    let (_, (key, value)) = all_consuming(data_line)
        .parse(line)
        .map_err(|_| line_error(number, format!("expected '<ID2|ADDR8> <VALUE8>', got '{line}'")))?;

    let layout = match key.len() {
        2 => MaskLayout::Indexed,
        8 => MaskLayout::Addressed,
        _ => {
            return Err(line_error(
                number,
                format!("key '{key}' is neither a 2-digit id nor an 8-digit address"),
            ))
        }
    };
    if value.len() != 8 {
        return Err(line_error(number, format!("value '{value}' is not 8 hex digits")));
    }

    let hex = |digits: &str| {
        u32::from_str_radix(digits, 16)
            .map_err(|_| line_error(number, format!("'{digits}' is not a 32-bit value")))
    };
    Ok(MaskLine {
        number,
        layout,
        key: hex(key)?,
        value: hex(value)?,
    })
}

/// Splits a mask file into its header and data lines
fn parse_lines(text: &str) -> Result<(MaskHeader, Vec<MaskLine>), ParseError> {
    let mut header = MaskHeader::default();
    let mut lines = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let number = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if header_tag(line).is_ok() {
            header = parse_header(number, line)?;
        } else if !line.starts_with('#') {
            lines.push(parse_data(number, line)?);
        }
    }
    Ok((header, lines))
}

/// Works out base address and mode for an addressed file
///
/// Header values win, then the model's base address. With neither, the
/// first line is taken to be register 0 of whichever block its low bits
/// point at.
fn address_block(
    model: &SchemaModel,
    header: &MaskHeader,
    first: u32,
    report: &mut DiagnosticsReport,
) -> (u32, MaskMode) {
    let capture = MaskMode::CaptureMask.address_offset();

    if let Some(base) = header.base_address.or(model.base_address()) {
        let mode = header.mode.unwrap_or(if first.wrapping_sub(base) >= capture {
            MaskMode::CaptureMask
        } else {
            MaskMode::EventMask
        });
        return (base, mode);
    }

    let mode = header.mode.unwrap_or(if first & 0x1FF == capture {
        MaskMode::CaptureMask
    } else {
        MaskMode::EventMask
    });
    let base = first.wrapping_sub(mode.address_offset());
    report.add_info(
        DiagnosticCode::GuessedBaseAddress,
        None,
        format!("Guessed base_address={}, mode={mode}", format_address(base)),
    );
    (base, mode)
}

/// Reads a mask file against a model
///
/// # Errors
///
/// `MaskFile` for malformed lines, ids outside the format's register range,
/// duplicate ids or addresses, misaligned addresses and files without data.
/// `MarkerMismatch` when the header names the other format.
///
/// mk2 words with bits 28-31 set are accepted with those bits cleared and
/// a warning. Non-zero words for registers the model does not declare are
/// dropped with a warning.
pub fn read_masks(model: &SchemaModel, bytes: &[u8]) -> Result<MaskImport, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::MaskFile {
        line: None,
        message: format!("not UTF-8: {e}"),
    })?;
    let (header, lines) = parse_lines(text)?;

    let format = model.format();
    if let Some(found) = header.format {
        if found != format {
            return Err(ParseError::MarkerMismatch {
                expected: format,
                found: found.marker().to_string(),
            });
        }
    }

    let Some(first) = lines.first() else {
        return Err(ParseError::MaskFile {
            line: None,
            message: "no mask lines".to_string(),
        });
    };
    let layout = first.layout;
    if let Some(stray) = lines.iter().find(|line| line.layout != layout) {
        return Err(line_error(stray.number, "mixes 2-digit ids and 8-digit addresses"));
    }

    let mut report = DiagnosticsReport::new();
    let mut mode = header.mode;
    let block = match layout {
        MaskLayout::Indexed => None,
        MaskLayout::Addressed if format != FormatKind::Mk2 => {
            return Err(line_error(first.number, "addressed lines need an mk2 definition"));
        }
        MaskLayout::Addressed => {
            let (base, block_mode) = address_block(model, &header, first.key, &mut report);
            mode = Some(block_mode);
            Some(base.wrapping_add(block_mode.address_offset()))
        }
    };

    let limit = format.max_registers();
    let usable = format.usable_bits();
    let registers = model.list_registers();
    let mut words = vec![0u32; registers.len()];
    let mut seen = HashSet::new();

    for line in &lines {
        let id = match block {
            None => line.key,
            Some(start) => {
                let offset = line.key.wrapping_sub(start);
                if offset % 4 != 0 {
                    return Err(line_error(
                        line.number,
                        format!("address {:08X} is not register aligned", line.key),
                    ));
                }
                offset / 4
            }
        };

        let index = usize::try_from(id).unwrap_or(usize::MAX);
        if index >= limit {
            return Err(line_error(
                line.number,
                format!("id {id:02X} is outside 00-{:02X} for {format}", limit - 1),
            ));
        }
        if !seen.insert(index) {
            return Err(line_error(line.number, format!("duplicate id {id:02X}")));
        }

        let mut value = line.value;
        if value & !usable != 0 {
            report.add_warning(
                DiagnosticCode::ReservedBits,
                registers.get(index).map(|r| r.id.as_str()),
                format!("Word {value:08X} has bits 28-31 set, clearing"),
            );
            value &= usable;
        }

        match words.get_mut(index) {
            Some(word) => *word = value,
            None if value != 0 => report.add_warning(
                DiagnosticCode::UndeclaredRegister,
                None,
                format!("No register at id {id:02X}, word {value:08X} ignored"),
            ),
            None => {}
        }
    }

    debug!(
        "Read {} mask line(s) ({:?}, mode {:?})",
        lines.len(),
        layout,
        mode
    );
    Ok(MaskImport {
        layout,
        mode,
        words,
        report,
    })
}

/// Renders words as a mask file with its header
///
/// mk2 definitions with a base address get addressed lines; everything
/// else gets indexed lines.
pub fn write_masks(model: &SchemaModel, words: &[MaskWord], mode: MaskMode) -> String {
    let header = MaskHeader {
        format: Some(model.format()),
        mode: Some(mode),
        base_address: model.base_address(),
    };
    let body = match (model.format(), model.base_address()) {
        (FormatKind::Mk2, Some(base)) => format_addressed(words, base, mode),
        _ => format_indexed(words),
    };
    format!("{header}\n{body}")
}
