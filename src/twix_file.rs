use crate::error::Result;
use crate::options::{AnonymizeOptions, DecodeOptions};
use crate::parser::parse_parsed_header;
use crate::processing::{ContainerLayout, TwixData, anonymize_container};
use crate::types::{HeaderBlock, MeasurementEntry, ParsedHeader, RecordOffsetTable, TwixVariant};
use crate::utils::file_utils::map_container;
use memmap2::Mmap;
use std::fs;
use std::path::Path;
use tracing::info;

/// A memory-mapped twix container with its layout already located
pub struct TwixFile {
    pub layout: ContainerLayout,
    mmap_data: Mmap,
}

impl TwixFile {
    /// Maps the file and locates its header block. Records are not read until
    /// [`TwixFile::decode`] or [`TwixFile::record_offsets`] is called.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mmap_data = map_container(path)?;
        let layout = ContainerLayout::locate(&mmap_data)?;
        info!(
            path = %path.display(),
            variant = ?layout.variant,
            len = mmap_data.len(),
            "opened twix file"
        );
        Ok(Self { layout, mmap_data })
    }

    pub fn variant(&self) -> TwixVariant {
        self.layout.variant
    }

    pub fn header_block(&self) -> &HeaderBlock {
        &self.layout.header
    }

    /// Entries of the measurement table; empty for non-indexed files.
    pub fn measurement_entries(&self) -> &[MeasurementEntry] {
        &self.layout.measurements
    }

    pub fn header_text(&self) -> String {
        self.layout.header_text(&self.mmap_data)
    }

    pub fn parsed_header(&self) -> Result<ParsedHeader> {
        parse_parsed_header(&self.header_text())
    }

    pub fn record_offsets(&self) -> Result<RecordOffsetTable> {
        self.layout.record_offsets(&self.mmap_data)
    }

    pub fn decode(&self) -> Result<TwixData> {
        self.decode_with(&DecodeOptions::default())
    }

    pub fn decode_with(&self, options: &DecodeOptions) -> Result<TwixData> {
        self.layout.decode(&self.mmap_data, options)
    }

    /// The anonymized container, byte for byte the same length as this one.
    pub fn anonymize_to_vec(&self, options: &AnonymizeOptions) -> Result<Vec<u8>> {
        anonymize_container(&self.mmap_data, options)
    }

    pub fn anonymize_to(&self, output: impl AsRef<Path>, options: &AnonymizeOptions) -> Result<()> {
        let anonymized = self.anonymize_to_vec(options)?;
        fs::write(output.as_ref(), anonymized)?;
        info!(path = %output.as_ref().display(), "wrote anonymized file");
        Ok(())
    }

    /// Get a summary of the file layout. Carries no patient information.
    pub fn get_summary(&self) -> String {
        let mut result = String::new();

        result.push_str("Twix file:\n");
        result.push_str(&format!("  Variant: {:?}\n", self.layout.variant));
        result.push_str(&format!("  Size: {} bytes\n", self.mmap_data.len()));

        if !self.layout.measurements.is_empty() {
            result.push_str(&format!(
                "\nMeasurements: {}\n",
                self.layout.measurements.len()
            ));
            for entry in &self.layout.measurements {
                result.push_str(&format!(
                    "  {} ({}): {} bytes at {}\n",
                    entry.meas_id, entry.protocol_name, entry.length, entry.offset
                ));
            }
        }

        let header = &self.layout.header;
        result.push_str("\nHeader:\n");
        result.push_str(&format!("  Offset: {}\n", header.start));
        result.push_str(&format!("  Length: {} bytes\n", header.header_size));
        result.push_str(&format!("  Records start: {}\n", header.records_start));

        result
    }
}
