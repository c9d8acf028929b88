use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::cache::binary::BinaryCache;
use crate::cache::json::JsonCache;
use crate::cache::{CacheMetadata, CachePayload};
use crate::data::green::GreenSpace;
use crate::errors::Result;
use crate::extract::GreenSpaceExtractor;
use crate::source::OsmSource;

/// Wraps the extraction pipeline with the per-source-file cache. A cache hit
/// skips all three passes; cache trouble of any kind degrades to a warning
/// and a fresh extraction.
pub struct GreenSpaceManager {
    extractor: GreenSpaceExtractor,
    json_cache: JsonCache,
    binary_cache: BinaryCache,
    use_cache: bool,
}

#[derive(Debug, Default)]
pub struct CacheInfo {
    pub json_cache_exists: bool,
    pub binary_cache_exists: bool,
    pub json_size_bytes: Option<u64>,
    pub binary_size_bytes: Option<u64>,
}

impl GreenSpaceManager {
    pub fn new(cache_dir: &Path, use_cache: bool) -> Result<GreenSpaceManager> {
        fs::create_dir_all(cache_dir)?;
        Ok(GreenSpaceManager {
            extractor: GreenSpaceExtractor::new(),
            json_cache: JsonCache::new(cache_dir),
            binary_cache: BinaryCache::new(cache_dir),
            use_cache,
        })
    }

    /// Cached result if present, otherwise a full extraction whose result is
    /// written back to both cache forms. `force_refresh` skips the cache read
    /// but not the write.
    pub fn get_green_spaces<S: OsmSource>(
        &self,
        source_file: &str,
        source: &S,
        force_refresh: bool,
    ) -> Result<Vec<GreenSpace>> {
        if self.use_cache && !force_refresh {
            if let Some(spaces) = self.load_cached(source_file) {
                return Ok(spaces);
            }
        }

        info!(source_file = source_file; "Extracting green spaces");
        let spaces = self.extractor.extract(source)?;

        if self.use_cache {
            self.store(source_file, &spaces);
        }

        Ok(spaces)
    }

    fn load_cached(&self, source_file: &str) -> Option<Vec<GreenSpace>> {
        if self.binary_cache.exists(source_file) {
            match self.binary_cache.load(source_file) {
                Ok(payload) => {
                    if let Some(spaces) = Self::verify_identity(payload, source_file, "binary") {
                        return Some(spaces);
                    }
                },
                Err(err) => {
                    warn!(err = err.message; "Binary cache unreadable, trying the json cache");
                },
            }
        }

        if self.json_cache.exists(source_file) {
            match self.json_cache.load(source_file) {
                Ok(payload) => {
                    if let Some(spaces) = Self::verify_identity(payload, source_file, "json") {
                        return Some(spaces);
                    }
                },
                Err(err) => {
                    warn!(err = err.message; "Json cache unreadable, extracting fresh");
                },
            }
        }

        None
    }

    // Cache files are named by source stem only, so two different paths can
    // map to the same file. The recorded source file tells the cases apart.
    fn verify_identity(
        payload: CachePayload,
        source_file: &str,
        format: &str,
    ) -> Option<Vec<GreenSpace>> {
        if payload.metadata.source_file == source_file {
            info!(
                format = format,
                count = payload.green_spaces.len(),
                export_date = payload.metadata.export_date.as_str();
                "Loaded green spaces from cache"
            );
            Some(payload.green_spaces)
        } else {
            warn!(
                format = format,
                cached_source = payload.metadata.source_file.as_str(),
                requested_source = source_file;
                "Cache entry belongs to a different source file, ignoring"
            );
            None
        }
    }

    fn store(&self, source_file: &str, spaces: &[GreenSpace]) {
        let payload = CachePayload {
            metadata: CacheMetadata {
                source_file: source_file.to_string(),
                export_date: chrono::Utc::now().to_rfc3339(),
                green_space_count: spaces.len() as u64,
            },
            green_spaces: spaces.to_vec(),
        };

        if let Err(err) = self.binary_cache.save(&payload) {
            warn!(err = err.message; "Could not write the binary cache");
        }
        if let Err(err) = self.json_cache.save(&payload) {
            warn!(err = err.message; "Could not write the json cache");
        }
    }

    pub fn cache_info(&self, source_file: &str) -> CacheInfo {
        let json_path = self.json_cache.cache_path(source_file);
        let binary_path = self.binary_cache.cache_path(source_file);

        CacheInfo {
            json_cache_exists: json_path.exists(),
            binary_cache_exists: binary_path.exists(),
            json_size_bytes: fs::metadata(&json_path).ok().map(|meta| meta.len()),
            binary_size_bytes: fs::metadata(&binary_path).ok().map(|meta| meta.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testutil::temp_cache_dir;
    use crate::source::testutil::{node, way, MemorySource};

    fn park_source() -> MemorySource {
        MemorySource::new(vec![
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 1.0, 1.0),
            node(4, 1.0, 0.0),
            way(100, &[("leisure", "park"), ("name", "Central Park")], &[1, 2, 3, 4]),
        ])
    }

    fn meadow_source() -> MemorySource {
        MemorySource::new(vec![
            node(10, 5.0, 5.0),
            way(200, &[("landuse", "meadow")], &[10]),
        ])
    }

    #[test]
    fn extraction_result_is_cached_and_served_back() {
        let dir = temp_cache_dir("manager_cache_hit");
        let manager = GreenSpaceManager::new(&dir, true).unwrap();

        let extracted = manager
            .get_green_spaces("region.osm", &park_source(), false)
            .unwrap();
        assert_eq!(extracted.len(), 1);

        let info = manager.cache_info("region.osm");
        assert!(info.json_cache_exists);
        assert!(info.binary_cache_exists);
        assert!(info.json_size_bytes.unwrap() > 0);
        assert!(info.binary_size_bytes.unwrap() > 0);

        // An empty source proves the second call never ran the pipeline.
        let cached = manager
            .get_green_spaces("region.osm", &MemorySource::new(Vec::new()), false)
            .unwrap();
        assert_eq!(cached, extracted);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_binary_cache_falls_back_to_json() {
        let dir = temp_cache_dir("manager_binary_fallback");
        let manager = GreenSpaceManager::new(&dir, true).unwrap();

        let extracted = manager
            .get_green_spaces("region.osm", &park_source(), false)
            .unwrap();

        let binary_path = manager.binary_cache.cache_path("region.osm");
        fs::write(&binary_path, b"garbage").unwrap();

        let cached = manager
            .get_green_spaces("region.osm", &MemorySource::new(Vec::new()), false)
            .unwrap();
        assert_eq!(cached, extracted);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_caches_fall_through_to_extraction() {
        let dir = temp_cache_dir("manager_both_corrupt");
        let manager = GreenSpaceManager::new(&dir, true).unwrap();

        manager
            .get_green_spaces("region.osm", &park_source(), false)
            .unwrap();
        fs::write(manager.binary_cache.cache_path("region.osm"), b"garbage").unwrap();
        fs::write(manager.json_cache.cache_path("region.osm"), b"{ nope").unwrap();

        let spaces = manager
            .get_green_spaces("region.osm", &meadow_source(), false)
            .unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].osm_id, 200);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn force_refresh_bypasses_the_cache_read() {
        let dir = temp_cache_dir("manager_force_refresh");
        let manager = GreenSpaceManager::new(&dir, true).unwrap();

        manager
            .get_green_spaces("region.osm", &park_source(), false)
            .unwrap();

        let refreshed = manager
            .get_green_spaces("region.osm", &meadow_source(), true)
            .unwrap();
        assert_eq!(refreshed[0].osm_id, 200);

        // The refreshed result replaced the cached one.
        let cached = manager
            .get_green_spaces("region.osm", &MemorySource::new(Vec::new()), false)
            .unwrap();
        assert_eq!(cached, refreshed);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cache_entry_for_another_path_with_the_same_stem_is_ignored() {
        let dir = temp_cache_dir("manager_stem_collision");
        let manager = GreenSpaceManager::new(&dir, true).unwrap();

        manager
            .get_green_spaces("a/region.osm", &park_source(), false)
            .unwrap();

        let spaces = manager
            .get_green_spaces("b/region.osm", &meadow_source(), false)
            .unwrap();
        assert_eq!(spaces[0].osm_id, 200);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn disabled_cache_writes_nothing() {
        let dir = temp_cache_dir("manager_no_cache");
        let manager = GreenSpaceManager::new(&dir, false).unwrap();

        manager
            .get_green_spaces("region.osm", &park_source(), false)
            .unwrap();

        let info = manager.cache_info("region.osm");
        assert!(!info.json_cache_exists);
        assert!(!info.binary_cache_exists);

        fs::remove_dir_all(&dir).unwrap();
    }
}
