//! Twix container parsing functionality

mod header_parser;
mod offset_table_parser;
pub mod param_parser;
pub mod record_parser;
pub mod vb_parser;
pub mod vd_parser;

// Re-export the parsing functions
pub use header_parser::{
    VB_HEADER_TRAILER_SIZE, detect_variant, parse_header_block, parse_measurement_entry,
    parse_measurement_table, parse_vb_header_block, parse_vd_header_block,
};
pub use offset_table_parser::parse_offset_table;
pub use param_parser::{ParamEntry, ParamTable, ParamValue, parse_parsed_header};
pub use record_parser::{RecordOutcome, ScanRecordDecoder, decode_record};
pub use vb_parser::VbDecoder;
pub use vd_parser::VdDecoder;
