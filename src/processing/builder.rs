//! Accumulation of scans and their assembly into one dense tensor

use crate::error::{Result, TwixError};
use crate::types::{LOOP_DIMENSIONS, ParsedHeader, PatientMetadata, ScanRecord};
use ndarray::{ArrayD, Axis, IxDyn};
use num_complex::Complex32;
use serde::Serialize;
use tracing::info;

/// A count that is fixed by its first assignment; later assignments must agree.
#[derive(Debug, Clone, Copy)]
pub struct SetOnce {
    what: &'static str,
    value: Option<usize>,
}

impl SetOnce {
    pub fn new(what: &'static str) -> Self {
        Self { what, value: None }
    }

    pub fn get(&self) -> Option<usize> {
        self.value
    }

    pub fn set(&mut self, value: usize) -> Result<()> {
        match self.value {
            None => {
                self.value = Some(value);
                Ok(())
            }
            Some(expected) if expected == value => Ok(()),
            Some(expected) => Err(TwixError::Consistency {
                what: self.what,
                expected,
                actual: value,
            }),
        }
    }
}

/// Scans collected from one file. Every scan must have the same channel and sample counts.
#[derive(Debug, Clone)]
pub struct ScanSet {
    scans: Vec<ScanRecord>,
    channel_count: SetOnce,
    sample_count: SetOnce,
}

impl Default for ScanSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSet {
    pub fn new() -> Self {
        Self {
            scans: Vec::new(),
            channel_count: SetOnce::new("channel count"),
            sample_count: SetOnce::new("sample count"),
        }
    }

    pub fn push(&mut self, scan: ScanRecord) -> Result<()> {
        self.channel_count.set(scan.channel_count())?;
        self.sample_count.set(scan.sample_count())?;
        self.scans.push(scan);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn channel_count(&self) -> Option<usize> {
        self.channel_count.get()
    }

    pub fn sample_count(&self) -> Option<usize> {
        self.sample_count.get()
    }

    pub fn scans(&self) -> &[ScanRecord] {
        &self.scans
    }

    /// Full tensor shape before squeezing: one more than the largest index seen in
    /// each loop dimension, then channels and samples.
    pub fn full_shape(&self) -> Option<Vec<usize>> {
        let channels = self.channel_count.get()?;
        let samples = self.sample_count.get()?;
        let mut shape = vec![0usize; LOOP_DIMENSIONS];
        for scan in &self.scans {
            for (extent, index) in shape.iter_mut().zip(scan.loop_index.iter()) {
                *extent = (*extent).max(index + 1);
            }
        }
        shape.extend([channels, samples]);
        Some(shape)
    }
}

/// Number of elements of `shape`, if a tensor of that shape can be allocated.
fn checked_element_count(shape: &[usize]) -> Result<usize> {
    let max_elements = isize::MAX as usize / std::mem::size_of::<Complex32>();
    shape
        .iter()
        .try_fold(1usize, |count, &extent| count.checked_mul(extent))
        .filter(|&count| count <= max_elements)
        .ok_or_else(|| TwixError::format(format!("tensor shape {shape:?} is too large to allocate")))
}

/// Scatters every scan into a zero-filled tensor and drops all axes of extent one.
/// Scans sharing a loop index overwrite each other in submission order.
pub fn build_tensor(scans: ScanSet) -> Result<ArrayD<Complex32>> {
    let shape = scans
        .full_shape()
        .ok_or_else(|| TwixError::format("no data records to assemble"))?;
    checked_element_count(&shape)?;
    let mut tensor = ArrayD::<Complex32>::zeros(IxDyn(&shape));

    for scan in scans.scans {
        let mut slot = tensor.view_mut();
        for index in scan.loop_index.iter() {
            slot = slot.index_axis_move(Axis(0), index);
        }
        slot.assign(&scan.data);
    }

    let squeezed: Vec<usize> = shape.iter().copied().filter(|&extent| extent != 1).collect();
    info!(full_shape = ?shape, shape = ?squeezed, "assembled tensor");
    Ok(tensor.into_shape_with_order(squeezed)?)
}

/// Decoded signal plus the header values the downstream data wrapper needs.
#[derive(Debug, Clone, Serialize)]
pub struct TwixData {
    pub data: ArrayD<Complex32>,
    /// Sample interval in seconds.
    pub dt: f64,
    /// Resonance frequency.
    pub f0: f64,
    pub protocol_name: String,
    pub metadata: PatientMetadata,
}

impl TwixData {
    pub fn metadata_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.metadata)
    }
}

/// Consumes the accumulated scans and packages them with the header values.
pub fn finalize(scans: ScanSet, header: &ParsedHeader) -> Result<TwixData> {
    let data = build_tensor(scans)?;
    Ok(TwixData {
        data,
        dt: header.dwell_time,
        f0: header.frequency,
        protocol_name: header.protocol_name.clone(),
        metadata: header.metadata(),
    })
}
