//! The decoding contract shared by both record layouts, and the field groups they have in common

use crate::error::{Result, TwixError};
use crate::types::{
    LOOP_DIMENSIONS, LoopIndex, RecordPreamble, ScanGeometry, ScanHeader, ScanRecord, TwixVariant,
};
use crate::utils::misc::SampleWindow;
use ndarray::Array2;
use num_complex::Complex32;
use tracing::{debug, trace};
use winnow::{
    Parser,
    binary::{le_f32, le_u16, le_u32},
    combinator::repeat,
    error::ContextError,
    token::take,
};

/// Mask selecting the DMA length from a record's composite first word.
pub const DMA_LENGTH_MASK: u32 = (1 << 26) - 1;

/// One of the two binary record layouts.
///
/// The field-group parsers work on a slice positioned at the relevant field and
/// advance it; [`decode_record`] drives them and owns all seeking.
pub trait ScanRecordDecoder: Sync {
    const VARIANT: TwixVariant;

    /// Reads the length word, the identifiers and the evaluation info mask.
    fn parse_preamble(input: &mut &[u8]) -> std::result::Result<RecordPreamble, ContextError>;

    /// Reads the rest of the measurement data header of a data record.
    fn parse_scan_header(input: &mut &[u8]) -> std::result::Result<ScanHeader, ContextError>;

    /// Reads whatever precedes the samples of `channel`, returning the channel id.
    fn parse_channel_header(
        input: &mut &[u8],
        channel: usize,
    ) -> std::result::Result<u16, ContextError>;

    /// Index of the first usable sample.
    fn sample_start(header: &ScanHeader) -> usize;
}

/// What one step of the record walk produced.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The end-of-acquisition record; nothing follows.
    AcquisitionEnd,
    /// An auxiliary record, passed over by its declared length.
    Skipped { next: usize },
    Scan { scan: ScanRecord, next: usize },
}

/// Decodes the record starting at `offset`.
pub fn decode_record<D: ScanRecordDecoder>(data: &[u8], offset: usize) -> Result<RecordOutcome> {
    let mut input = data.get(offset..).ok_or(TwixError::Truncated {
        offset,
        context: "record preamble",
    })?;
    let preamble =
        D::parse_preamble(&mut input).map_err(TwixError::truncated(offset, "record preamble"))?;

    if preamble.flags.is_acquisition_end() {
        debug!(offset, "end of acquisition");
        return Ok(RecordOutcome::AcquisitionEnd);
    }

    let next = next_record_offset(&preamble, offset, data.len())?;

    if preamble.flags.is_auxiliary() {
        debug!(
            offset,
            dma_length = preamble.dma_length,
            flags = ?preamble.flags.set_flag_names(),
            "skipping auxiliary record"
        );
        return Ok(RecordOutcome::Skipped { next });
    }

    // Everything after the preamble must fit in the declared record length.
    let consumed = data.len() - offset - input.len();
    if consumed > preamble.dma_length {
        return Err(TwixError::format(format!(
            "record at offset {offset} declares {} bytes, shorter than its own preamble",
            preamble.dma_length
        )));
    }
    let mut body = &data[offset + consumed..next];
    let scan = decode_scan_body::<D>(&mut body, offset)?;
    trace!(
        offset,
        scan_counter = preamble.scan_counter,
        loop_index = ?scan.loop_index.named_counters(),
        "decoded scan"
    );
    Ok(RecordOutcome::Scan { scan, next })
}

/// The offset of the record after this one, checked against the end of the data.
pub fn next_record_offset(preamble: &RecordPreamble, offset: usize, data_len: usize) -> Result<usize> {
    if preamble.dma_length == 0 {
        return Err(TwixError::format(format!(
            "record at offset {offset} declares a zero length"
        )));
    }
    let next = offset + preamble.dma_length;
    if next > data_len {
        return Err(TwixError::Truncated {
            offset,
            context: "record body",
        });
    }
    Ok(next)
}

fn decode_scan_body<D: ScanRecordDecoder>(input: &mut &[u8], offset: usize) -> Result<ScanRecord> {
    let header =
        D::parse_scan_header(input).map_err(TwixError::truncated(offset, "scan header"))?;
    let start = D::sample_start(&header);
    let window = SampleWindow::new(header.sample_count, start).ok_or_else(|| {
        TwixError::format(format!(
            "record at offset {offset} has {} samples, none usable from index {start}",
            header.sample_count
        ))
    })?;

    let mut samples = Vec::with_capacity(header.channel_count * window.len);
    for channel in 0..header.channel_count {
        let channel_id = D::parse_channel_header(input, channel)
            .map_err(TwixError::truncated(offset, "channel header"))?;
        let raw = parse_samples(input, header.sample_count)
            .map_err(TwixError::truncated(offset, "channel samples"))?;
        trace!(channel, channel_id, "read channel");
        samples.extend_from_slice(&raw[window.range()]);
    }

    let data = Array2::from_shape_vec((header.channel_count, window.len), samples)?;
    Ok(ScanRecord::builder()
        .loop_index(header.loop_index)
        .data(data)
        .build())
}

/// Composite length word and the four identifiers common to both layouts.
pub(crate) fn parse_record_prefix(
    input: &mut &[u8],
) -> std::result::Result<RecordPreamble, ContextError> {
    let composite = le_u32.parse_next(input)?;
    let meas_uid = le_u32.parse_next(input)?;
    let scan_counter = le_u32.parse_next(input)?;
    let time_stamp = le_u32.parse_next(input)?;
    let pmu_time_stamp = le_u32.parse_next(input)?;

    Ok(RecordPreamble::builder()
        .dma_length((composite & DMA_LENGTH_MASK) as usize)
        .pack_flag((composite >> 25) & 1 == 1)
        .pci_rx((composite >> 26) as u8)
        .meas_uid(meas_uid)
        .scan_counter(scan_counter)
        .time_stamp(time_stamp)
        .pmu_time_stamp(pmu_time_stamp)
        .flags(Default::default())
        .build())
}

pub(crate) fn parse_u16_array<const N: usize>(
    input: &mut &[u8],
) -> std::result::Result<[u16; N], ContextError> {
    let mut values = [0u16; N];
    for value in values.iter_mut() {
        *value = le_u16.parse_next(input)?;
    }
    Ok(values)
}

pub(crate) fn parse_loop_index(input: &mut &[u8]) -> std::result::Result<LoopIndex, ContextError> {
    parse_u16_array::<LOOP_DIMENSIONS>(input).map(LoopIndex::from)
}

/// Cut-off data through k-space centre partition; 20 bytes in both layouts.
pub(crate) fn parse_geometry(input: &mut &[u8]) -> std::result::Result<ScanGeometry, ContextError> {
    let cut_off_data = le_u32.parse_next(input)?;
    let kspace_centre_column = le_u16.parse_next(input)?;
    let coil_select = le_u16.parse_next(input)?;
    let readout_offcentre = le_u32.parse_next(input)?;
    let time_since_rf = le_u32.parse_next(input)?;
    let kspace_centre_line = le_u16.parse_next(input)?;
    let kspace_centre_partition = le_u16.parse_next(input)?;

    Ok(ScanGeometry {
        cut_off_data,
        kspace_centre_column,
        coil_select,
        readout_offcentre,
        time_since_rf,
        kspace_centre_line,
        kspace_centre_partition,
        slice_position: [0.0; 7],
    })
}

pub(crate) fn parse_slice_position(input: &mut &[u8]) -> std::result::Result<[f32; 7], ContextError> {
    let mut position = [0f32; 7];
    for value in position.iter_mut() {
        *value = le_f32.parse_next(input)?;
    }
    Ok(position)
}

/// Reads `count` interleaved (re, im) pairs. The container stores the conjugate, so
/// the imaginary part is negated.
pub(crate) fn parse_samples(
    input: &mut &[u8],
    count: usize,
) -> std::result::Result<Vec<Complex32>, ContextError> {
    repeat(
        count,
        (le_f32, le_f32).map(|(re, im): (f32, f32)| Complex32::new(re, -im)),
    )
    .parse_next(input)
}

pub(crate) fn skip(input: &mut &[u8], count: usize) -> std::result::Result<(), ContextError> {
    take(count).void().parse_next(input)
}
