//! Record layout of indexed (VD) containers
//!
//! The measurement data header is 192 bytes and each channel is preceded by a
//! short 32-byte channel header instead of a full copy.

use crate::parser::record_parser::{
    ScanRecordDecoder, parse_geometry, parse_loop_index, parse_record_prefix,
    parse_slice_position, parse_u16_array, skip,
};
use crate::types::{EvalInfoMask, RecordPreamble, ScanHeader, TwixVariant};
use winnow::{
    Parser,
    binary::{le_u16, le_u32, le_u64},
    error::ContextError,
};

/// Slot of the ICE program parameters holding the FID start offset.
pub const FID_START_ICE_PARAM: usize = 4;

pub struct VdDecoder;

impl ScanRecordDecoder for VdDecoder {
    const VARIANT: TwixVariant = TwixVariant::Vd;

    fn parse_preamble(input: &mut &[u8]) -> Result<RecordPreamble, ContextError> {
        let mut preamble = parse_record_prefix(input)?;
        // System type, PTAB delay and x/y/z, reserved. Consumed for alignment only.
        let _system_type = le_u16.parse_next(input)?;
        let _ptab_pos_delay = le_u16.parse_next(input)?;
        skip(input, 16)?;
        preamble.flags = EvalInfoMask(le_u64.parse_next(input)?);
        Ok(preamble)
    }

    fn parse_scan_header(input: &mut &[u8]) -> Result<ScanHeader, ContextError> {
        let sample_count = le_u16.parse_next(input)?;
        let channel_count = le_u16.parse_next(input)?;
        let loop_index = parse_loop_index(input)?;
        let mut geometry = parse_geometry(input)?;
        geometry.slice_position = parse_slice_position(input)?;
        let ice_program_params = parse_u16_array::<24>(input)?;
        let reserved_params = parse_u16_array::<4>(input)?;
        let _application_counter = le_u16.parse_next(input)?;
        let _application_mask = le_u16.parse_next(input)?;
        let _crc = le_u32.parse_next(input)?;

        Ok(ScanHeader::builder()
            .sample_count(sample_count as usize)
            .channel_count(channel_count as usize)
            .loop_index(loop_index)
            .geometry(geometry)
            .ice_program_params(ice_program_params.to_vec())
            .free_params(reserved_params)
            .build())
    }

    fn parse_channel_header(input: &mut &[u8], _channel: usize) -> Result<u16, ContextError> {
        let _dma_length = le_u32.parse_next(input)?;
        let _meas_uid = le_u32.parse_next(input)?;
        let _scan_counter = le_u32.parse_next(input)?;
        skip(input, 4)?;
        let _sequence_time = le_u32.parse_next(input)?;
        skip(input, 4)?;
        let channel_id = le_u16.parse_next(input)?;
        skip(input, 6)?;
        Ok(channel_id)
    }

    fn sample_start(header: &ScanHeader) -> usize {
        header.ice_program_params[FID_START_ICE_PARAM] as usize + header.dummy_points()
    }
}
