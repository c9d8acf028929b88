use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use rkyv::AlignedVec;
use xz::bufread::XzDecoder;
use xz::write::XzEncoder;

use crate::cache::{cache_path, write_atomically, CachePayload};
use crate::errors::{Error, Result};

pub const EXTENSION: &str = "rkyv.xz";
const COMPRESSION_LEVEL: u32 = 6;

/// Fast binary form of the cache: an rkyv archive, xz-compressed. Loads are
/// validated, so a corrupt or truncated file surfaces as an error the caller
/// can treat as a miss.
pub struct BinaryCache {
    cache_dir: PathBuf,
}

impl BinaryCache {
    pub fn new(cache_dir: &Path) -> BinaryCache {
        BinaryCache {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn cache_path(&self, source_file: &str) -> PathBuf {
        cache_path(&self.cache_dir, source_file, EXTENSION)
    }

    pub fn exists(&self, source_file: &str) -> bool {
        self.cache_path(source_file).exists()
    }

    pub fn save(&self, payload: &CachePayload) -> Result<()> {
        let bytes = rkyv::to_bytes::<_, 256>(payload)
            .map_err(|err| Error::from(format!("could not archive the cache payload: {:?}", err)))?;

        let mut encoder = XzEncoder::new(Vec::new(), COMPRESSION_LEVEL);
        encoder.write_all(&bytes)?;
        let compressed = encoder.finish()?;

        write_atomically(&self.cache_path(&payload.metadata.source_file), &compressed)
    }

    pub fn load(&self, source_file: &str) -> Result<CachePayload> {
        let file = File::open(self.cache_path(source_file))?;
        let mut decoder = XzDecoder::new(BufReader::new(file));
        let mut bytes: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut bytes)?;

        // The decompressed buffer has no alignment guarantee; the archive
        // needs one before validation.
        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        rkyv::from_bytes::<CachePayload>(&aligned)
            .map_err(|_| Error::from("binary cache is corrupt or incompatible"))
    }
}
