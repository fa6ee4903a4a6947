//! Reader for the twix MR raw-data container and anonymizer for its parameter header

pub mod error;
pub mod options;
pub mod parser;
pub mod processing;
pub mod twix_file;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use error::{Result, TwixError};
pub use options::{AnonymizeOptions, DecodeOptions};
pub use processing::{TwixData, anonymize_container, anonymize_header, decode_container};
pub use twix_file::TwixFile;
pub use types::{
    MeasurementEntry, ParsedHeader, PatientMetadata, RecordOffsetTable, TwixVariant,
};

use std::io::Read;
use std::path::Path;

/// Decodes the spectroscopy data and header values of the file at `path`.
pub fn load_twix(path: impl AsRef<Path>) -> Result<TwixData> {
    TwixFile::open(path)?.decode()
}

/// Decodes a container from any byte source. The whole stream is read into memory.
pub fn load_twix_from_reader<R: Read>(mut reader: R) -> Result<TwixData> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    decode_container(&data, &DecodeOptions::default())
}

/// Writes an anonymized copy of `input` to `output` using the default replacements.
pub fn anonymize_twix(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    TwixFile::open(input)?.anonymize_to(output, &AnonymizeOptions::default())
}
