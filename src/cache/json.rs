use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::cache::{cache_path, write_atomically, CachePayload};
use crate::errors::Result;

pub const EXTENSION: &str = "json";

/// Portable text form of the cache: one pretty-printed JSON document per
/// source file.
pub struct JsonCache {
    cache_dir: PathBuf,
}

impl JsonCache {
    pub fn new(cache_dir: &Path) -> JsonCache {
        JsonCache {
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
        let bytes = serde_json::to_vec_pretty(payload)?;
        write_atomically(&self.cache_path(&payload.metadata.source_file), &bytes)
    }

    pub fn load(&self, source_file: &str) -> Result<CachePayload> {
        let file = File::open(self.cache_path(source_file))?;
        let payload = serde_json::from_reader(BufReader::new(file))?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testutil::{sample_payload, temp_cache_dir};
    use std::fs;

    #[test]
    fn save_then_load_round_trips() {
        let dir = temp_cache_dir("json_round_trip");
        fs::create_dir_all(&dir).unwrap();
        let cache = JsonCache::new(&dir);

        let payload = sample_payload("region.osm");
        cache.save(&payload).unwrap();
        assert!(cache.exists("region.osm"));

        let loaded = cache.load("region.osm").unwrap();
        assert_eq!(loaded, payload);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn written_document_matches_the_schema() {
        let dir = temp_cache_dir("json_schema");
        fs::create_dir_all(&dir).unwrap();
        let cache = JsonCache::new(&dir);

        cache.save(&sample_payload("region.osm")).unwrap();
        let text = fs::read_to_string(cache.cache_path("region.osm")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["metadata"]["source_file"], "region.osm");
        assert_eq!(value["metadata"]["green_space_count"], 2);
        let park = &value["green_spaces"][0];
        assert_eq!(park["osm_id"], 100);
        assert_eq!(park["osm_type"], "way");
        assert_eq!(park["space_type"], "park");
        assert_eq!(park["centroid"][0], 52.45);
        assert_eq!(park["coordinates"][1][1], -1.95);
        assert_eq!(park["perimeter_m"], serde_json::Value::Null);
        let reserve = &value["green_spaces"][1];
        assert_eq!(reserve["name"], "Unnamed");
        assert_eq!(reserve["centroid"], serde_json::Value::Null);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_document_is_an_error_not_a_panic() {
        let dir = temp_cache_dir("json_corrupt");
        fs::create_dir_all(&dir).unwrap();
        let cache = JsonCache::new(&dir);

        fs::write(cache.cache_path("region.osm"), b"{ not json").unwrap();
        assert!(cache.load("region.osm").is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = temp_cache_dir("json_missing");
        fs::create_dir_all(&dir).unwrap();
        let cache = JsonCache::new(&dir);

        assert!(!cache.exists("region.osm"));
        assert!(cache.load("region.osm").is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
