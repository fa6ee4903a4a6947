//! Container-level decoding: locate the header, walk the records, assemble the tensor

use crate::error::{Result, TwixError};
use crate::options::DecodeOptions;
use crate::parser::{
    RecordOutcome, ScanRecordDecoder, VbDecoder, VdDecoder, decode_record, detect_variant,
    parse_measurement_table, parse_offset_table, parse_parsed_header, parse_vb_header_block,
    parse_vd_header_block,
};
use crate::processing::builder::{ScanSet, TwixData, finalize};
use crate::types::{HeaderBlock, MeasurementEntry, RecordOffsetTable, TwixVariant};
use crate::utils::encoding::decode_header_text;
use rayon::prelude::*;
use tracing::{debug, info};

/// Where everything is in one container, found without touching the record stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
    pub variant: TwixVariant,
    /// The measurement table (indexed layout only).
    pub measurements: Vec<MeasurementEntry>,
    pub header: HeaderBlock,
}

impl ContainerLayout {
    pub fn locate(data: &[u8]) -> Result<Self> {
        let variant = detect_variant(data)?;
        debug!(?variant, len = data.len(), "detected container variant");

        let (measurements, header) = match variant {
            TwixVariant::Vb => (Vec::new(), parse_vb_header_block(data)?),
            TwixVariant::Vd => {
                let measurements = parse_measurement_table(data)?;
                // The last measurement is assumed to be the spectroscopy one; earlier
                // entries are typically adjustment scans.
                let entry = measurements
                    .last()
                    .ok_or_else(|| TwixError::format("measurement table is empty"))?;
                debug!(
                    count = measurements.len(),
                    meas_id = entry.meas_id,
                    offset = entry.offset,
                    "selected last measurement"
                );
                let header = parse_vd_header_block(data, entry)?;
                (measurements, header)
            }
        };
        debug!(
            header_size = header.header_size,
            records_start = header.records_start,
            "located header block"
        );

        Ok(Self {
            variant,
            measurements,
            header,
        })
    }

    pub fn header_text(&self, data: &[u8]) -> String {
        decode_header_text(&data[self.header.text.clone()])
    }

    pub fn record_offsets(&self, data: &[u8]) -> Result<RecordOffsetTable> {
        match self.variant {
            TwixVariant::Vb => parse_offset_table::<VbDecoder>(data, self.header.records_start),
            TwixVariant::Vd => parse_offset_table::<VdDecoder>(data, self.header.records_start),
        }
    }

    pub fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<TwixData> {
        let header = parse_parsed_header(&self.header_text(data))?;
        let start = self.header.records_start;
        let scans = match (self.variant, options.parallel) {
            (TwixVariant::Vb, false) => collect_scans::<VbDecoder>(data, start)?,
            (TwixVariant::Vd, false) => collect_scans::<VdDecoder>(data, start)?,
            (TwixVariant::Vb, true) => collect_scans_parallel::<VbDecoder>(data, start)?,
            (TwixVariant::Vd, true) => collect_scans_parallel::<VdDecoder>(data, start)?,
        };
        finalize(scans, &header)
    }
}

/// Detects the layout and decodes the whole container.
pub fn decode_container(data: &[u8], options: &DecodeOptions) -> Result<TwixData> {
    ContainerLayout::locate(data)?.decode(data, options)
}

/// Reads records one after another until the end-of-acquisition record.
pub fn collect_scans<D: ScanRecordDecoder>(data: &[u8], records_start: usize) -> Result<ScanSet> {
    let mut scans = ScanSet::new();
    let mut offset = records_start;
    let mut skipped = 0usize;

    loop {
        match decode_record::<D>(data, offset)? {
            RecordOutcome::AcquisitionEnd => break,
            RecordOutcome::Skipped { next } => {
                skipped += 1;
                offset = next;
            }
            RecordOutcome::Scan { scan, next } => {
                scans.push(scan)?;
                offset = next;
            }
        }
    }

    info!(
        variant = ?D::VARIANT,
        scans = scans.len(),
        skipped,
        "read record stream"
    );
    Ok(scans)
}

/// Indexes the record stream first, then decodes the data records on the rayon pool.
pub fn collect_scans_parallel<D: ScanRecordDecoder>(
    data: &[u8],
    records_start: usize,
) -> Result<ScanSet> {
    let table = parse_offset_table::<D>(data, records_start)?;
    let offsets: Vec<usize> = table.data_records().map(|entry| entry.offset).collect();

    let decoded = offsets
        .par_iter()
        .map(|&offset| match decode_record::<D>(data, offset)? {
            RecordOutcome::Scan { scan, .. } => Ok(scan),
            _ => Err(TwixError::format(format!(
                "record at offset {offset} was indexed as data but did not decode as a scan"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut scans = ScanSet::new();
    for scan in decoded {
        scans.push(scan)?;
    }
    info!(
        variant = ?D::VARIANT,
        scans = scans.len(),
        skipped = table.skipped_count(),
        "read record stream in parallel"
    );
    Ok(scans)
}
