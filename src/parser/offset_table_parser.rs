//! First pass over the record stream: offsets and flags only

use crate::error::{Result, TwixError};
use crate::parser::record_parser::{ScanRecordDecoder, next_record_offset};
use crate::types::offset_table::{RecordEntry, RecordOffsetTable};
use tracing::debug;

/// Walks the records from `records_start` by their declared lengths, reading only
/// each preamble, up to and including the end-of-acquisition record.
pub fn parse_offset_table<D: ScanRecordDecoder>(
    data: &[u8],
    records_start: usize,
) -> Result<RecordOffsetTable> {
    let mut entries = Vec::new();
    let mut offset = records_start;

    loop {
        let mut input = data.get(offset..).ok_or(TwixError::Truncated {
            offset,
            context: "record preamble",
        })?;
        let preamble = D::parse_preamble(&mut input)
            .map_err(TwixError::truncated(offset, "record preamble"))?;

        entries.push(RecordEntry {
            offset,
            dma_length: preamble.dma_length,
            flags: preamble.flags,
        });
        if preamble.flags.is_acquisition_end() {
            break;
        }
        offset = next_record_offset(&preamble, offset, data.len())?;
    }

    let table = RecordOffsetTable::builder().entries(entries).build();
    debug!(
        variant = ?D::VARIANT,
        records = table.len(),
        skipped = table.skipped_count(),
        "indexed record stream"
    );
    Ok(table)
}
