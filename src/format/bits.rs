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

//! src/format/bits.rs
//!
//! Scalar notations used inside definition documents
//!
//! - Bit ranges: `"n"` for a single bit, `"lo-hi"` for an inclusive run
//! - Addresses: `0x`-prefixed hexadecimal
//! - Identifiers: `[A-Za-z_][A-Za-z0-9_.-]*`
//!
//! Each notation is a small nom parser wrapped by a function that demands
//! the whole input be consumed.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, hex_digit1, satisfy, space0},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::core::types::BitRange;
use crate::format::ParseError;

fn bit_index(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>).parse(input)
}

/// `lo` optionally followed by `-hi`
fn bit_span(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    (
        bit_index,
        opt(preceded((space0, char('-'), space0), bit_index)),
    )
        .parse(input)
}

/// Parses `"n"` or `"lo-hi"` (inclusive) into a bit range
pub fn parse_bit_range(input: &str) -> Result<BitRange, ParseError> {
    let invalid = || ParseError::InvalidBitRange(input.to_string());

    let (_, (low, high)) = all_consuming(delimited(space0, bit_span, space0))
        .parse(input)
        .map_err(|_| invalid())?;

    BitRange::inclusive(low, high.unwrap_or(low)).ok_or_else(invalid)
}

fn hex_literal(input: &str) -> IResult<&str, &str> {
    preceded(alt((tag("0x"), tag("0X"))), hex_digit1).parse(input)
}

/// Parses a `0x`-prefixed hexadecimal 32-bit value
pub fn parse_address(input: &str) -> Result<u32, ParseError> {
    let invalid = || ParseError::InvalidAddress(input.to_string());

    let (_, digits) = all_consuming(delimited(space0, hex_literal, space0))
        .parse(input)
        .map_err(|_| invalid())?;

    u32::from_str_radix(digits, 16).map_err(|_| invalid())
}

pub fn format_address(address: u32) -> String {
    format!("0x{address:08X}")
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')),
    ))
    .parse(input)
}

pub fn is_identifier(input: &str) -> bool {
    all_consuming(identifier).parse(input).is_ok()
}

/// Fails with `InvalidIdentifier` unless `input` is a well-formed identifier
pub fn check_identifier(input: &str) -> Result<(), ParseError> {
    if is_identifier(input) {
        Ok(())
    } else {
        Err(ParseError::InvalidIdentifier(input.to_string()))
    }
}
