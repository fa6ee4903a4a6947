//! File mapping, header text encoding and sample window helpers

pub mod encoding;
pub mod file_utils;
pub mod misc;

pub use file_utils::map_container;
pub use misc::{SampleWindow, largest_power_of_two_at_most};
