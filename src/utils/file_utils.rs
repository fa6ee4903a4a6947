//! Read-only memory mapping of container files

use crate::error::{Result, TwixError};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Bytes needed to tell the two layouts apart.
const MIN_CONTAINER_LEN: u64 = 8;

/// Maps a container file read-only. Files too short to hold the leading words
/// are rejected before mapping.
pub fn map_container(path: impl AsRef<Path>) -> Result<Mmap> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < MIN_CONTAINER_LEN {
        return Err(TwixError::Truncated {
            offset: 0,
            context: "leading words",
        });
    }
    // Safety: the mapping is read-only and the file is not modified while mapped
    let mmap = unsafe { Mmap::map(&file) }?;
    debug!(path = %path.display(), len, "mapped container");
    Ok(mmap)
}
