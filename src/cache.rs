pub mod binary;
pub mod json;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::green::GreenSpace;
use crate::errors::Result;

pub const CACHE_SUFFIX: &str = "_green_spaces";

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize,
         Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct CacheMetadata {
    pub source_file: String,
    pub export_date: String,
    pub green_space_count: u64,
}

/// What both persisted forms carry; they round-trip to the same value.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize,
         Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct CachePayload {
    pub metadata: CacheMetadata,
    pub green_spaces: Vec<GreenSpace>,
}

/// `<source-file-stem>_green_spaces.<ext>` under the cache root.
pub fn cache_path(cache_dir: &Path, source_file: &str, extension: &str) -> PathBuf {
    let stem = Path::new(source_file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("source");
    cache_dir.join(format!("{}{}.{}", stem, CACHE_SUFFIX, extension))
}

// Whole-file write then rename, so a crashed writer leaves no torn cache file
// behind under the final name.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
