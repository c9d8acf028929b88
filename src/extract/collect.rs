use std::collections::HashSet;

use crate::data::osm::Element;
use crate::errors::Result;
use crate::extract::classify::Classifier;
use crate::source::OsmSource;

/// Pass 1: the ids of every node referenced by an accepted way, plus the
/// number of accepted ways. Nothing else of the stream is retained.
pub fn collect_node_refs<S: OsmSource>(
    source: &S,
    classifier: &Classifier,
) -> Result<(HashSet<u64>, u64)> {
    let mut needed: HashSet<u64> = HashSet::new();
    let mut matched_ways: u64 = 0;

    for item in tqdm::tqdm(source.stream()?) {
        match item? {
            Element::Way(way) => {
                if classifier.accepts(&way.tags) {
                    matched_ways += 1;
                    needed.extend(way.node_refs.iter().copied());
                }
            },
            // Relation members live in a different id namespace and are never
            // resolved; nodes carry no references.
            Element::Node(_) | Element::Relation(_) => (),
        }
    }

    Ok((needed, matched_ways))
}
