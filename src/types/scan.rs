//! Types for scan records and the fields of their measurement data headers

use bon::Builder;
use ndarray::Array2;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Number of acquisition loop counters carried by every scan.
pub const LOOP_DIMENSIONS: usize = 14;

/// Loop counter names, in on-disk order.
pub const LOOP_DIMENSION_NAMES: [&str; LOOP_DIMENSIONS] = [
    "line",
    "acquisition",
    "slice",
    "partition",
    "echo",
    "phase",
    "repetition",
    "set",
    "segment",
    "ida",
    "idb",
    "idc",
    "idd",
    "ide",
];

/// Position of a scan in the acquisition loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LoopIndex(pub [u16; LOOP_DIMENSIONS]);

impl LoopIndex {
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&i| i as usize)
    }

    /// Non-zero counters paired with their dimension names.
    pub fn named_counters(&self) -> Vec<(&'static str, usize)> {
        LOOP_DIMENSION_NAMES
            .iter()
            .copied()
            .zip(self.iter())
            .filter(|&(_, index)| index != 0)
            .collect()
    }
}

impl From<[u16; LOOP_DIMENSIONS]> for LoopIndex {
    fn from(counters: [u16; LOOP_DIMENSIONS]) -> Self {
        LoopIndex(counters)
    }
}

/// The 64-bit evaluation info mask of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalInfoMask(pub u64);

impl EvalInfoMask {
    pub const ACQ_END: u32 = 0;
    pub const RT_FEEDBACK: u32 = 1;
    pub const HP_FEEDBACK: u32 = 2;
    pub const SYNC_DATA: u32 = 5;
    pub const RAW_DATA_CORRECTION: u32 = 10;
    pub const REF_PHASE_STAB_SCAN: u32 = 14;
    pub const PHASE_STAB_SCAN: u32 = 15;
    pub const SIGN_REV: u32 = 17;
    pub const PHASE_CORRECTION: u32 = 21;
    pub const PAT_REF_SCAN: u32 = 22;
    pub const PAT_REF_IMA_SCAN: u32 = 23;
    pub const REFLECT: u32 = 24;
    pub const NOISE_ADJ_SCAN: u32 = 25;

    const NAMED: [(u32, &'static str); 13] = [
        (Self::ACQ_END, "acq_end"),
        (Self::RT_FEEDBACK, "rt_feedback"),
        (Self::HP_FEEDBACK, "hp_feedback"),
        (Self::SYNC_DATA, "sync_data"),
        (Self::RAW_DATA_CORRECTION, "raw_data_correction"),
        (Self::REF_PHASE_STAB_SCAN, "ref_phase_stab_scan"),
        (Self::PHASE_STAB_SCAN, "phase_stab_scan"),
        (Self::SIGN_REV, "sign_rev"),
        (Self::PHASE_CORRECTION, "phase_correction"),
        (Self::PAT_REF_SCAN, "pat_ref_scan"),
        (Self::PAT_REF_IMA_SCAN, "pat_ref_ima_scan"),
        (Self::REFLECT, "reflect"),
        (Self::NOISE_ADJ_SCAN, "noise_adj_scan"),
    ];

    /// Flags that mark a record as auxiliary data rather than signal.
    const AUXILIARY: [u32; 5] = [
        Self::RT_FEEDBACK,
        Self::HP_FEEDBACK,
        Self::PHASE_CORRECTION,
        Self::NOISE_ADJ_SCAN,
        Self::SYNC_DATA,
    ];

    pub fn is_set(&self, bit: u32) -> bool {
        (self.0 >> bit) & 1 == 1
    }

    pub fn is_acquisition_end(&self) -> bool {
        self.is_set(Self::ACQ_END)
    }

    /// True for feedback, sync, phase-correction and noise-adjustment records.
    pub fn is_auxiliary(&self) -> bool {
        Self::AUXILIARY.iter().any(|&bit| self.is_set(bit))
    }

    /// Names of the known flags that are set, for diagnostics.
    pub fn set_flag_names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(bit, _)| self.is_set(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// The fields every record starts with, enough to classify it and find the next one.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct RecordPreamble {
    /// Declared total length of the record in bytes.
    pub dma_length: usize,
    pub pack_flag: bool,
    pub pci_rx: u8,
    pub meas_uid: u32,
    pub scan_counter: u32,
    pub time_stamp: u32,
    pub pmu_time_stamp: u32,
    pub flags: EvalInfoMask,
}

/// Geometry fields of a measurement data header. Read to stay aligned, not used downstream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanGeometry {
    pub cut_off_data: u32,
    pub kspace_centre_column: u16,
    pub coil_select: u16,
    pub readout_offcentre: u32,
    pub time_since_rf: u32,
    pub kspace_centre_line: u16,
    pub kspace_centre_partition: u16,
    pub slice_position: [f32; 7],
}

/// The data-bearing part of a measurement data header.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ScanHeader {
    pub sample_count: usize,
    pub channel_count: usize,
    pub loop_index: LoopIndex,
    pub geometry: ScanGeometry,
    pub ice_program_params: Vec<u16>,
    /// "Free" parameters (non-indexed) or reserved parameters (indexed); the first is the dummy point count.
    pub free_params: [u16; 4],
}

impl ScanHeader {
    pub fn dummy_points(&self) -> usize {
        self.free_params[0] as usize
    }
}

/// One accepted scan: where it goes and its channels × samples matrix.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ScanRecord {
    pub loop_index: LoopIndex,
    pub data: Array2<Complex32>,
}

impl ScanRecord {
    pub fn channel_count(&self) -> usize {
        self.data.nrows()
    }

    pub fn sample_count(&self) -> usize {
        self.data.ncols()
    }
}
