use bon::Builder;
use serde::{Deserialize, Serialize};

/// Size in bytes of one entry of the indexed layout's measurement table.
pub const MEASUREMENT_ENTRY_SIZE: usize = 152;

/// Offset of the first measurement table entry.
pub const MEASUREMENT_TABLE_OFFSET: usize = 8;

/// One entry of the measurement table at the start of an indexed container.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub meas_id: u32,
    pub file_id: u32,
    /// Absolute offset of the measurement's header block.
    pub offset: u64,
    /// Length in bytes of the whole measurement.
    pub length: u64,
    pub patient_name: String,
    pub protocol_name: String,
}
