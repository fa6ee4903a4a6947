//! Removal of patient identifying information from the parameter text
//!
//! Every redaction keeps the character count of what it replaces (apart from a
//! birth date written in an unusual width), so the re-encoded header has the same
//! byte length and the offsets of everything after it stay valid.

use crate::error::{Result, TwixError};
use crate::options::AnonymizeOptions;
use crate::parser::param_parser::{
    PARAM_LONG, PARAM_STRING, ParamTable, ParamValue, numeric_string, tag_pattern,
};
use crate::parser::{detect_variant, parse_vb_header_block};
use crate::types::TwixVariant;
use crate::utils::encoding::{decode_header_text, encode_header_text};
use std::ops::Range;
use tracing::{debug, warn};

/// How a located span is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redaction {
    /// Every character except quote delimiters becomes the filler.
    Mask(char),
    /// The span is replaced by this text.
    Literal(String),
    /// Every ASCII digit becomes the given digit.
    Digits(char),
    /// Every alphanumeric character becomes the filler; separators stay.
    Alphanumeric(char),
}

/// A span of the header text and the rule that rewrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiField {
    pub span: Range<usize>,
    pub rule: Redaction,
}

impl PhiField {
    fn replacement(&self, original: &str) -> String {
        match &self.rule {
            Redaction::Mask(filler) => original
                .chars()
                .map(|c| if c == '"' { c } else { *filler })
                .collect(),
            Redaction::Literal(text) => text.clone(),
            Redaction::Digits(digit) => original
                .chars()
                .map(|c| if c.is_ascii_digit() { *digit } else { c })
                .collect(),
            Redaction::Alphanumeric(filler) => original
                .chars()
                .map(|c| if c.is_alphanumeric() || c == '_' { *filler } else { c })
                .collect(),
        }
    }
}

/// Rewrites non-overlapping fields, back to front so earlier spans stay valid.
pub fn apply_redactions(text: &mut String, mut fields: Vec<PhiField>) {
    fields.sort_by_key(|field| field.span.start);
    for field in fields.iter().rev() {
        let replacement = field.replacement(&text[field.span.clone()]);
        text.replace_range(field.span.clone(), &replacement);
    }
}

/// Every occurrence of `needle`, each tagged with `rule`.
fn occurrences(text: &str, needle: &str, rule: &Redaction) -> Vec<PhiField> {
    text.match_indices(needle)
        .map(|(start, found)| PhiField {
            span: start..start + found.len(),
            rule: rule.clone(),
        })
        .collect()
}

/// The quoted value token of the single `<ParamString."name">` entry.
fn canonical_text_field(text: &str, name: &str) -> Result<String> {
    let table = ParamTable::parse(text);
    let entry = table
        .exactly_one(PARAM_STRING, name)
        .map_err(|count| TwixError::PatternNotFound {
            pattern: tag_pattern(PARAM_STRING, name),
            count,
        })?;
    match entry.value {
        ParamValue::Text(_) => Ok(entry.raw.to_owned()),
        ParamValue::Integer(_) => Err(TwixError::format(format!(
            "{} holds a number, expected quoted text",
            tag_pattern(PARAM_STRING, name)
        ))),
    }
}

/// Applies `rule` to every quoted occurrence of the canonical field's value.
fn redact_everywhere(text: &mut String, name: &str, rule: Redaction) -> Result<()> {
    let quoted = canonical_text_field(text, name)?;
    if quoted.len() <= 2 {
        debug!(field = name, "field is empty, nothing to redact");
        return Ok(());
    }
    let fields = occurrences(text, &quoted, &rule);
    debug!(field = name, occurrences = fields.len(), "redacting");
    apply_redactions(text, fields);
    Ok(())
}

/// Zeroes the canonical sex field, then every single-digit field whose name ends
/// in "Sex". Returns how many fields besides the canonical one were rewritten.
fn redact_sex(text: &mut String, value: char) -> Result<usize> {
    let canonical = {
        let table = ParamTable::parse(text);
        let entry = table
            .exactly_one(PARAM_LONG, "PatientSex")
            .map_err(|count| TwixError::PatternNotFound {
                pattern: tag_pattern(PARAM_LONG, "PatientSex"),
                count,
            })?;
        PhiField {
            span: entry.span.clone(),
            rule: Redaction::Digits(value),
        }
    };
    let canonical_span = canonical.span.clone();
    apply_redactions(text, vec![canonical]);

    let duplicates: Vec<PhiField> = ParamTable::parse(text)
        .entries()
        .iter()
        .filter(|entry| entry.name.ends_with("Sex") && entry.span != canonical_span)
        .filter(|entry| matches!(entry.value, ParamValue::Integer(digits) if digits.len() == 1))
        .map(|entry| PhiField {
            span: entry.span.clone(),
            rule: Redaction::Digits(value),
        })
        .collect();
    let rewritten = duplicates.len();
    if rewritten == 0 {
        warn!("no sex field found besides the canonical one");
    }
    apply_redactions(text, duplicates);
    Ok(rewritten)
}

/// The two-digit-year exam date (`YYMMDD`) taken from the frame of reference UID.
pub fn exam_date(text: &str) -> Result<String> {
    let frame_of_reference = canonical_text_field(text, "FrameOfReference")?;
    frame_of_reference
        .split('.')
        .nth(10)
        .and_then(|component| component.get(2..8))
        .map(str::to_owned)
        .ok_or_else(|| {
            TwixError::format("FrameOfReference has no date component at position 10")
        })
}

/// Quoted digit-and-dot strings containing `date`.
fn exam_date_fields(text: &str, date: &str, filler: char) -> Vec<PhiField> {
    let mut fields = Vec::new();
    let mut from = 0;
    while let Some(found) = text[from..].find('"') {
        let open = from + found;
        let mut input = &text[open..];
        match numeric_string(&mut input) {
            Ok(contents) if contents.contains(date) => {
                let close = text.len() - input.len();
                fields.push(PhiField {
                    span: open..close,
                    rule: Redaction::Alphanumeric(filler),
                });
                from = close;
            }
            _ => from = open + 1,
        }
    }
    fields
}

/// Returns the header text with patient identifiers, birth date, sex and every
/// exam date reference overwritten.
pub fn anonymize_header(text: &str, options: &AnonymizeOptions) -> Result<String> {
    options.validate()?;
    let mut text = text.to_owned();

    redact_everywhere(&mut text, "PatientID", Redaction::Mask(options.filler))?;

    let birth_date = format!("\"{}\"", options.birth_date);
    let original = canonical_text_field(&text, "PatientBirthDay")?;
    if original.len() != birth_date.len() {
        warn!(
            original_len = original.len(),
            replacement_len = birth_date.len(),
            "birth date replacement changes the header length"
        );
    }
    redact_everywhere(&mut text, "PatientBirthDay", Redaction::Literal(birth_date))?;

    redact_everywhere(&mut text, "PatientName", Redaction::Mask(options.filler))?;

    redact_sex(&mut text, options.sex_value)?;

    let date = exam_date(&text)?;
    let fields = exam_date_fields(&text, &date, options.filler);
    debug!(occurrences = fields.len(), "redacting exam date references");
    apply_redactions(&mut text, fields);

    Ok(text)
}

/// Anonymizes a whole non-indexed container. The result has the input's length:
/// the length word, opaque trailer and record stream are copied verbatim.
pub fn anonymize_container(data: &[u8], options: &AnonymizeOptions) -> Result<Vec<u8>> {
    if detect_variant(data)? == TwixVariant::Vd {
        return Err(TwixError::Unsupported(
            "anonymization of indexed (VD) containers".to_owned(),
        ));
    }
    let block = parse_vb_header_block(data)?;
    let text = decode_header_text(&data[block.text.clone()]);
    let anonymized = encode_header_text(&anonymize_header(&text, options)?)?;
    if anonymized.len() != block.text.len() {
        return Err(TwixError::format(format!(
            "anonymized header is {} bytes, the container needs {}",
            anonymized.len(),
            block.text.len()
        )));
    }

    let mut output = Vec::with_capacity(data.len());
    output.extend_from_slice(&data[..block.text.start]);
    output.extend_from_slice(&anonymized);
    output.extend_from_slice(&data[block.text.end..]);
    Ok(output)
}
