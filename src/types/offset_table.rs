use crate::types::scan::EvalInfoMask;
use bon::bon;

/// Where one record starts and what its preamble declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEntry {
    pub offset: usize,
    pub dma_length: usize,
    pub flags: EvalInfoMask,
}

impl RecordEntry {
    pub fn end(&self) -> usize {
        self.offset + self.dma_length
    }

    pub fn carries_data(&self) -> bool {
        !self.flags.is_acquisition_end() && !self.flags.is_auxiliary()
    }
}

/// Offsets of every record from the first one up to and including the end-of-acquisition record.
#[derive(Debug, PartialEq)]
pub struct RecordOffsetTable {
    pub entries: Vec<RecordEntry>,
}

#[bon]
impl RecordOffsetTable {
    #[builder]
    pub fn new(entries: Vec<RecordEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that hold signal data, in file order.
    pub fn data_records(&self) -> impl Iterator<Item = &RecordEntry> + '_ {
        self.entries.iter().filter(|entry| entry.carries_data())
    }

    /// Number of auxiliary records that decoding skips.
    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.flags.is_auxiliary() && !entry.flags.is_acquisition_end())
            .count()
    }

    /// The terminating record, if the walk reached it.
    pub fn acquisition_end(&self) -> Option<&RecordEntry> {
        self.entries.last().filter(|entry| entry.flags.is_acquisition_end())
    }
}
