pub mod assemble;
pub mod classify;
pub mod collect;
pub mod harvest;

use log::info;

use crate::data::green::GreenSpace;
use crate::errors::Result;
use crate::source::OsmSource;

use self::classify::Classifier;

/// Memory-bounded green space extraction.
///
/// The source is traversed three times: pass 1 collects the ids of every node
/// referenced by an accepted way, pass 2 keeps coordinates for exactly those
/// ids, pass 3 assembles the output records. Each pass hands its working set
/// to the next by move, so the id set dies with pass 2 and the coordinate map
/// with pass 3; at no point is the full node table in memory.
pub struct GreenSpaceExtractor {
    classifier: Classifier,
}

impl GreenSpaceExtractor {
    pub fn new() -> GreenSpaceExtractor {
        GreenSpaceExtractor {
            classifier: Classifier::new(),
        }
    }

    pub fn extract<S: OsmSource>(&self, source: &S) -> Result<Vec<GreenSpace>> {
        info!("Pass 1: collecting node ids referenced by green space ways");
        let (needed, matched_ways) = collect::collect_node_refs(source, &self.classifier)?;
        info!(matched_ways = matched_ways, needed_nodes = needed.len(); "Pass 1 finished");

        info!("Pass 2: harvesting coordinates of referenced nodes");
        let coords = harvest::harvest_coordinates(source, needed)?;
        info!(resolved_nodes = coords.len(); "Pass 2 finished");

        info!("Pass 3: assembling green spaces");
        let spaces = assemble::assemble_green_spaces(source, &self.classifier, coords)?;
        info!(green_spaces = spaces.len(); "Pass 3 finished");

        Ok(spaces)
    }
}

impl Default for GreenSpaceExtractor {
    fn default() -> Self {
        GreenSpaceExtractor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::green::{GreenSpaceType, OsmType};
    use crate::source::testutil::{node, relation, way, MemorySource};

    // Stream order is deliberately awkward: the way comes before its nodes and
    // unrelated records are mixed in.
    fn scrambled_source() -> MemorySource {
        MemorySource::new(vec![
            way(100, &[("leisure", "park"), ("name", "Central Park")], &[1, 2, 3, 4]),
            node(9000, 40.0, -73.0),
            node(2, 0.0, 1.0),
            way(101, &[("highway", "primary")], &[5, 6]),
            node(1, 0.0, 0.0),
            relation(500, &[("leisure", "nature_reserve")]),
            node(4, 1.0, 0.0),
            node(3, 1.0, 1.0),
            node(5, 2.0, 2.0),
        ])
    }

    #[test]
    fn pipeline_extracts_geometry_regardless_of_stream_order() {
        let extractor = GreenSpaceExtractor::new();
        let spaces = extractor.extract(&scrambled_source()).unwrap();

        assert_eq!(spaces.len(), 2);

        let park = &spaces[0];
        assert_eq!(park.osm_id, 100);
        assert_eq!(park.osm_type, OsmType::Way);
        assert_eq!(park.name.as_deref(), Some("Central Park"));
        assert_eq!(park.space_type, GreenSpaceType::Park);
        assert_eq!(park.coordinates.len(), 4);
        let centroid = park.centroid.unwrap();
        assert_eq!(centroid.lat, 0.5);
        assert_eq!(centroid.lon, 0.5);

        let reserve = &spaces[1];
        assert_eq!(reserve.osm_id, 500);
        assert_eq!(reserve.osm_type, OsmType::Relation);
        assert_eq!(reserve.space_type, GreenSpaceType::NatureReserve);
        assert!(reserve.coordinates.is_empty());
        assert!(reserve.centroid.is_none());
    }

    #[test]
    fn repeated_extraction_is_idempotent() {
        let source = scrambled_source();
        let extractor = GreenSpaceExtractor::new();

        let first = extractor.extract(&source).unwrap();
        let second = extractor.extract(&source).unwrap();
        assert_eq!(first, second);
    }
}
