use std::ops::Range;

/// The largest power of two that is `<= n`, or `None` for zero.
pub fn largest_power_of_two_at_most(n: usize) -> Option<usize> {
    if n == 0 {
        None
    } else {
        Some(1 << (usize::BITS - 1 - n.leading_zeros()))
    }
}

/// The usable slice of a channel's samples: `len` samples starting at `start`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    pub start: usize,
    pub len: usize,
}

impl SampleWindow {
    /// The window after discarding `start` leading samples, rounded down to a power of two.
    pub fn new(sample_count: usize, start: usize) -> Option<Self> {
        let available = sample_count.checked_sub(start)?;
        let len = largest_power_of_two_at_most(available)?;
        Some(Self { start, len })
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}
