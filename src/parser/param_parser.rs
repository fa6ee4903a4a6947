//! Tokenizer for the parameter text block
//!
//! Parameters are written as `<Kind."Name">  { value  }`. Only entries whose value
//! is a single quoted string or an unsigned integer are collected; maps, arrays and
//! entries with modifiers such as `<Precision>` are passed over.

use crate::error::{Result, TwixError};
use crate::types::header::ParsedHeader;
use itertools::Itertools;
use std::ops::Range;
use winnow::{
    Parser,
    ascii::{digit1, multispace0},
    combinator::{alt, delimited},
    error::ContextError,
    token::{take_till, take_while},
};

pub const PARAM_STRING: &str = "ParamString";
pub const PARAM_LONG: &str = "ParamLong";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue<'a> {
    /// Quoted text, without the quotes.
    Text(&'a str),
    /// Unsigned decimal digits.
    Integer(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry<'a> {
    pub kind: &'a str,
    pub name: &'a str,
    pub value: ParamValue<'a>,
    /// The value token as written, quotes included.
    pub raw: &'a str,
    /// Byte range of `raw` within the text.
    pub span: Range<usize>,
}

/// Every well-formed scalar parameter of a header text, in order of appearance.
#[derive(Debug)]
pub struct ParamTable<'a> {
    entries: Vec<ParamEntry<'a>>,
}

impl<'a> ParamTable<'a> {
    pub fn parse(text: &'a str) -> Self {
        let entries = text
            .match_indices('<')
            .filter_map(|(start, _)| entry_at(text, start))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ParamEntry<'a>] {
        &self.entries
    }

    /// The single entry of `kind` named `name`, or the number of matches when that is not one.
    pub fn exactly_one(&self, kind: &str, name: &str) -> std::result::Result<&ParamEntry<'a>, usize> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.name == name)
            .exactly_one()
            .map_err(|matches| matches.count())
    }

    fn required(&self, kind: &str, name: &str) -> Result<&ParamEntry<'a>> {
        self.exactly_one(kind, name)
            .map_err(|count| TwixError::MissingParameter {
                name: tag_pattern(kind, name),
                count,
            })
    }

    pub fn required_text(&self, name: &str) -> Result<&'a str> {
        match self.required(PARAM_STRING, name)?.value {
            ParamValue::Text(text) => Ok(text),
            ParamValue::Integer(_) => Err(TwixError::format(format!(
                "{} holds a number, expected quoted text",
                tag_pattern(PARAM_STRING, name)
            ))),
        }
    }

    pub fn required_integer(&self, name: &str) -> Result<u64> {
        match self.required(PARAM_LONG, name)?.value {
            ParamValue::Integer(digits) => digits.parse().map_err(|_| {
                TwixError::format(format!(
                    "{} value {digits} does not fit in 64 bits",
                    tag_pattern(PARAM_LONG, name)
                ))
            }),
            ParamValue::Text(_) => Err(TwixError::format(format!(
                "{} holds text, expected an integer",
                tag_pattern(PARAM_LONG, name)
            ))),
        }
    }
}

/// How a tag is written in the header, for error messages.
pub fn tag_pattern(kind: &str, name: &str) -> String {
    format!("<{kind}.\"{name}\">")
}

/// Extracts the parameters needed to interpret the scan data.
pub fn parse_parsed_header(text: &str) -> Result<ParsedHeader> {
    let table = ParamTable::parse(text);

    let protocol_name = table.required_text("tProtocolName")?;
    let patient_id = table.required_text("PatientID")?;
    let patient_name = table.required_text("PatientName")?;
    let patient_birthdate = table.required_text("PatientBirthDay")?;
    let frequency = table.required_integer("Frequency")?;
    let dwell_time = table.required_integer("DwellTimeSig")?;

    Ok(ParsedHeader::builder()
        .protocol_name(protocol_name)
        .patient_id(patient_id)
        .patient_name(patient_name)
        .patient_birthdate(patient_birthdate)
        .frequency(frequency as f64 * 1e-6)
        .dwell_time(dwell_time as f64 * 1e-9)
        .build())
}

fn entry_at(text: &str, start: usize) -> Option<ParamEntry<'_>> {
    let mut input = &text[start..];
    let (kind, name) = param_tag(&mut input).ok()?;
    open_brace(&mut input).ok()?;
    let value_start = text.len() - input.len();
    let value = param_value(&mut input).ok()?;
    let value_end = text.len() - input.len();
    close_brace(&mut input).ok()?;

    Some(ParamEntry {
        kind,
        name,
        value,
        raw: &text[value_start..value_end],
        span: value_start..value_end,
    })
}

/// `<Kind."Name">`
fn param_tag<'i>(input: &mut &'i str) -> std::result::Result<(&'i str, &'i str), ContextError> {
    (
        '<',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
        '.',
        quoted,
        '>',
    )
        .map(|(_, kind, _, name, _)| (kind, name))
        .parse_next(input)
}

fn open_brace(input: &mut &str) -> std::result::Result<(), ContextError> {
    (multispace0, '{', multispace0).void().parse_next(input)
}

fn close_brace(input: &mut &str) -> std::result::Result<(), ContextError> {
    (multispace0, '}').void().parse_next(input)
}

fn param_value<'i>(input: &mut &'i str) -> std::result::Result<ParamValue<'i>, ContextError> {
    alt((quoted.map(ParamValue::Text), digit1.map(ParamValue::Integer))).parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> std::result::Result<&'i str, ContextError> {
    delimited('"', take_till(0.., '"'), '"').parse_next(input)
}

/// A quoted string made only of digits and dots, such as a UID or a timestamp.
/// Returns the contents without quotes.
pub fn numeric_string<'i>(input: &mut &'i str) -> std::result::Result<&'i str, ContextError> {
    delimited(
        '"',
        take_while(0.., |c: char| c.is_ascii_digit() || c == '.'),
        '"',
    )
    .parse_next(input)
}
