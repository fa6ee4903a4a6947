use crate::error::{Result, TwixError};
use crate::types::header::{HeaderBlock, TwixVariant};
use crate::types::measurement::{
    MEASUREMENT_ENTRY_SIZE, MEASUREMENT_TABLE_OFFSET, MeasurementEntry,
};
use crate::utils::encoding::decode_fixed_string;
use winnow::{
    Parser,
    binary::{le_u32, le_u64},
    error::ContextError,
    token::take,
};

/// Size of the opaque block that ends a non-indexed header.
pub const VB_HEADER_TRAILER_SIZE: usize = 24;

/// Reads the two leading `u32` values used for variant detection.
pub fn parse_leading_words(input: &mut &[u8]) -> std::result::Result<(u32, u32), ContextError> {
    let first = le_u32.parse_next(input)?;
    let second = le_u32.parse_next(input)?;
    Ok((first, second))
}

pub fn detect_variant(data: &[u8]) -> Result<TwixVariant> {
    let mut input = data;
    let (first, second) =
        parse_leading_words(&mut input).map_err(TwixError::truncated(0, "leading words"))?;
    Ok(TwixVariant::from_leading_words(first, second))
}

/// Parses a header block at `start`: a `u32` length (counting itself), the text,
/// and `trailer` bytes of non-text data at its end.
///
/// The layout is:
/// - 4 bytes: little-endian u32 header size `L`
/// - `L - 4 - trailer` bytes: parameter text
/// - `trailer` bytes: opaque
pub fn parse_header_block(data: &[u8], start: usize, trailer: usize) -> Result<HeaderBlock> {
    let mut input = data.get(start..).ok_or(TwixError::Truncated {
        offset: start,
        context: "header length",
    })?;
    let header_size = le_u32
        .parse_next(&mut input)
        .map_err(TwixError::truncated(start, "header length"))? as usize;

    if header_size < 4 + trailer {
        return Err(TwixError::format(format!(
            "header at offset {start} declares {header_size} bytes, less than its fixed parts"
        )));
    }
    let end = start + header_size;
    if end > data.len() {
        return Err(TwixError::Truncated {
            offset: start,
            context: "header block",
        });
    }

    Ok(HeaderBlock::builder()
        .start(start)
        .header_size(header_size)
        .text(start + 4..end - trailer)
        .opaque(end - trailer..end)
        .records_start(end)
        .build())
}

pub fn parse_vb_header_block(data: &[u8]) -> Result<HeaderBlock> {
    parse_header_block(data, 0, VB_HEADER_TRAILER_SIZE)
}

/// The header block of the measurement an indexed container's entry points at.
pub fn parse_vd_header_block(data: &[u8], entry: &MeasurementEntry) -> Result<HeaderBlock> {
    let start = usize::try_from(entry.offset).map_err(|_| {
        TwixError::format(format!("measurement offset {} out of range", entry.offset))
    })?;
    parse_header_block(data, start, 0)
}

/// Parses one 152-byte measurement table entry:
/// - u32 measurement id, u32 file id
/// - u64 offset, u64 length
/// - 64-byte patient name, 64-byte protocol name (NUL padded)
pub fn parse_measurement_entry(
    input: &mut &[u8],
) -> std::result::Result<MeasurementEntry, ContextError> {
    let meas_id = le_u32.parse_next(input)?;
    let file_id = le_u32.parse_next(input)?;
    let offset = le_u64.parse_next(input)?;
    let length = le_u64.parse_next(input)?;
    let patient_name = take(64usize).parse_next(input)?;
    let protocol_name = take(64usize).parse_next(input)?;

    Ok(MeasurementEntry::builder()
        .meas_id(meas_id)
        .file_id(file_id)
        .offset(offset)
        .length(length)
        .patient_name(decode_fixed_string(patient_name))
        .protocol_name(decode_fixed_string(protocol_name))
        .build())
}

/// Parses the measurement table at the start of an indexed container.
pub fn parse_measurement_table(data: &[u8]) -> Result<Vec<MeasurementEntry>> {
    let mut input = data;
    let (_, count) =
        parse_leading_words(&mut input).map_err(TwixError::truncated(0, "leading words"))?;
    if count == 0 {
        return Err(TwixError::format("measurement table is empty"));
    }

    (0..count as usize)
        .map(|i| {
            let offset = MEASUREMENT_TABLE_OFFSET + i * MEASUREMENT_ENTRY_SIZE;
            let mut input = data.get(offset..).ok_or(TwixError::Truncated {
                offset,
                context: "measurement entry",
            })?;
            parse_measurement_entry(&mut input)
                .map_err(TwixError::truncated(offset, "measurement entry"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestRecord, VB_TRAILER, sample_header, vb_container, vd_container};

    #[test]
    fn test_detect_variant() -> Result<()> {
        let records = [TestRecord::acquisition_end()];
        assert_eq!(
            detect_variant(&vb_container(&sample_header(), &records))?,
            TwixVariant::Vb
        );
        assert_eq!(
            detect_variant(&vd_container(&[("x", &records[..])]))?,
            TwixVariant::Vd
        );
        // A zero first word with an implausible measurement count is not indexed.
        assert_eq!(TwixVariant::from_leading_words(0, 65), TwixVariant::Vb);
        assert!(matches!(detect_variant(&[0, 0, 0]), Err(TwixError::Truncated { .. })));
        Ok(())
    }

    #[test]
    fn test_vb_header_block() -> Result<()> {
        let text = "<ParamLong.\"Frequency\">  { 1  }";
        let data = vb_container(text, &[TestRecord::acquisition_end()]);
        let block = parse_vb_header_block(&data)?;
        assert_eq!(block.header_size, 4 + text.len() + VB_HEADER_TRAILER_SIZE);
        assert_eq!(&data[block.text.clone()], text.as_bytes());
        assert_eq!(&data[block.opaque.clone()], &VB_TRAILER[..]);
        assert_eq!(block.records_start, block.header_size);
        Ok(())
    }

    #[test]
    fn test_header_longer_than_data_is_truncated() {
        let mut data = vb_container("abc", &[]);
        data.truncate(10);
        assert!(matches!(
            parse_vb_header_block(&data),
            Err(TwixError::Truncated { context: "header block", .. })
        ));

        let mut short = 8u32.to_le_bytes().to_vec();
        short.resize(40, b' ');
        assert!(matches!(parse_vb_header_block(&short), Err(TwixError::Format(_))));
    }

    #[test]
    fn test_measurement_table() -> Result<()> {
        let records = [TestRecord::acquisition_end()];
        let data = vd_container(&[("first", &records[..]), ("second", &records[..])]);
        let entries = parse_measurement_table(&data)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].meas_id, 1);
        assert_eq!(entries[1].file_id, 101);
        assert_eq!(entries[0].patient_name, "Doe^Jane");
        assert_eq!(entries[1].protocol_name, "meas1");
        assert_eq!(
            entries[0].offset + entries[0].length,
            entries[1].offset
        );

        let block = parse_vd_header_block(&data, &entries[1])?;
        assert_eq!(&data[block.text.clone()], b"second");
        assert!(block.opaque.is_empty());

        let mut empty = vec![0u8; 8];
        empty.extend_from_slice(&[0u8; 16]);
        assert!(matches!(parse_measurement_table(&empty), Err(TwixError::Format(_))));
        Ok(())
    }
}
