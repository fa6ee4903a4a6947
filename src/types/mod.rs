//! Type definitions for the twix raw data container

pub mod header;
pub mod measurement;
pub mod offset_table;
pub mod scan;

// Re-export the main types for convenience
pub use header::{HeaderBlock, ParsedHeader, PatientMetadata, TwixVariant};
pub use measurement::MeasurementEntry;
pub use offset_table::{RecordEntry, RecordOffsetTable};
pub use scan::{
    EvalInfoMask, LOOP_DIMENSION_NAMES, LOOP_DIMENSIONS, LoopIndex, RecordPreamble, ScanGeometry,
    ScanHeader, ScanRecord,
};
