use bon::Builder;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The two record layouts a container can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwixVariant {
    /// Non-indexed layout: the header block sits at byte 0.
    Vb,
    /// Indexed layout: a measurement table at byte 8 points at each sub-measurement.
    Vd,
}

impl TwixVariant {
    /// Variant detection from the two leading `u32` values of the file.
    pub fn from_leading_words(first: u32, second: u32) -> Self {
        if first == 0 && second <= 64 {
            TwixVariant::Vd
        } else {
            TwixVariant::Vb
        }
    }
}

/// Where the text parameter block and the record stream live in the file.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct HeaderBlock {
    /// Offset of the `u32` header length word.
    pub start: usize,
    /// Declared header length, including the length word itself.
    pub header_size: usize,
    /// Bytes holding the windows-1252 parameter text.
    pub text: Range<usize>,
    /// Trailing non-text bytes of the block (empty for the indexed layout).
    pub opaque: Range<usize>,
    /// Offset of the first scan record.
    pub records_start: usize,
}

/// Values pulled out of the parameter text.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct ParsedHeader {
    #[builder(into)]
    pub protocol_name: String,
    #[builder(into)]
    pub patient_id: String,
    #[builder(into)]
    pub patient_name: String,
    #[builder(into)]
    pub patient_birthdate: String,
    /// Sample interval in seconds.
    pub dwell_time: f64,
    /// Resonance frequency (f0).
    pub frequency: f64,
}

impl ParsedHeader {
    pub fn metadata(&self) -> PatientMetadata {
        PatientMetadata {
            patient_name: self.patient_name.clone(),
            patient_id: self.patient_id.clone(),
            patient_birthdate: self.patient_birthdate.clone(),
        }
    }
}

/// Identifying values handed to the downstream data wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMetadata {
    pub patient_name: String,
    pub patient_id: String,
    pub patient_birthdate: String,
}
