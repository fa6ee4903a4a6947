//! Record layout of non-indexed (VB) containers
//!
//! Every channel of a scan carries its own copy of the 128-byte measurement data
//! header. The first copy is read as the scan header; later copies are skipped
//! except for their last four bytes (channel id and PTAB position).

use crate::parser::record_parser::{
    ScanRecordDecoder, parse_geometry, parse_loop_index, parse_record_prefix,
    parse_slice_position, parse_u16_array, skip,
};
use crate::types::{EvalInfoMask, RecordPreamble, ScanHeader, TwixVariant};
use winnow::{
    Parser,
    binary::{le_i16, le_u16, le_u64},
    error::ContextError,
};

/// Bytes of the per-channel header copy that precede the channel id.
pub const VB_REPEATED_HEADER_SIZE: usize = 124;

pub struct VbDecoder;

impl ScanRecordDecoder for VbDecoder {
    const VARIANT: TwixVariant = TwixVariant::Vb;

    fn parse_preamble(input: &mut &[u8]) -> Result<RecordPreamble, ContextError> {
        let mut preamble = parse_record_prefix(input)?;
        preamble.flags = EvalInfoMask(le_u64.parse_next(input)?);
        Ok(preamble)
    }

    fn parse_scan_header(input: &mut &[u8]) -> Result<ScanHeader, ContextError> {
        let sample_count = le_u16.parse_next(input)?;
        let channel_count = le_u16.parse_next(input)?;
        let loop_index = parse_loop_index(input)?;
        let mut geometry = parse_geometry(input)?;
        let ice_program_params = parse_u16_array::<4>(input)?;
        let free_params = parse_u16_array::<4>(input)?;
        geometry.slice_position = parse_slice_position(input)?;

        Ok(ScanHeader::builder()
            .sample_count(sample_count as usize)
            .channel_count(channel_count as usize)
            .loop_index(loop_index)
            .geometry(geometry)
            .ice_program_params(ice_program_params.to_vec())
            .free_params(free_params)
            .build())
    }

    fn parse_channel_header(input: &mut &[u8], channel: usize) -> Result<u16, ContextError> {
        if channel > 0 {
            skip(input, VB_REPEATED_HEADER_SIZE)?;
        }
        let channel_id = le_u16.parse_next(input)?;
        let _ptab_pos_neg = le_i16.parse_next(input)?;
        Ok(channel_id)
    }

    fn sample_start(header: &ScanHeader) -> usize {
        header.dummy_points()
    }
}
