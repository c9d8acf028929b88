use std::collections::HashMap;

use crate::data::green::{Coordinates, GreenSpace, OsmType, UNNAMED};
use crate::data::osm::{Element, Relation, Tags, Way};
use crate::errors::Result;
use crate::extract::classify::Classifier;
use crate::source::OsmSource;

/// Pass 3: build the output records. Accepted ways resolve their vertex list
/// against the harvested coordinates; accepted relations are emitted without
/// geometry (member resolution is a different id namespace and out of scope).
/// The coordinate map is consumed and freed when this pass returns.
pub fn assemble_green_spaces<S: OsmSource>(
    source: &S,
    classifier: &Classifier,
    coords: HashMap<u64, Coordinates>,
) -> Result<Vec<GreenSpace>> {
    let mut spaces: Vec<GreenSpace> = Vec::new();

    for item in tqdm::tqdm(source.stream()?) {
        match item? {
            Element::Way(way) => {
                if classifier.accepts(&way.tags) {
                    spaces.push(from_way(&way, classifier, &coords));
                }
            },
            Element::Relation(relation) => {
                if classifier.accepts(&relation.tags) {
                    spaces.push(from_relation(&relation, classifier));
                }
            },
            Element::Node(_) => (),
        }
    }

    Ok(spaces)
}

fn from_way(way: &Way, classifier: &Classifier, coords: &HashMap<u64, Coordinates>) -> GreenSpace {
    // Dangling references drop out silently; the resolved coordinates keep
    // the declared order.
    let coordinates: Vec<Coordinates> = way
        .node_refs
        .iter()
        .filter_map(|node_ref| coords.get(node_ref).copied())
        .collect();

    GreenSpace {
        osm_id: way.id,
        osm_type: OsmType::Way,
        name: name_from_tags(&way.tags),
        space_type: classifier.categorize(&way.tags),
        centroid: centroid_of(&coordinates),
        area_sq_m: parse_area_tag(&way.tags),
        perimeter_m: None,
        tags: way.tags.clone(),
        version: way.info.version,
        changeset: way.info.changeset,
        timestamp: way.info.timestamp.clone(),
        node_count: way.node_refs.len() as u64,
        node_ids: way.node_refs.clone(),
        coordinates,
    }
}

fn from_relation(relation: &Relation, classifier: &Classifier) -> GreenSpace {
    GreenSpace {
        osm_id: relation.id,
        osm_type: OsmType::Relation,
        name: name_from_tags(&relation.tags),
        space_type: classifier.categorize(&relation.tags),
        centroid: None,
        coordinates: Vec::new(),
        area_sq_m: None,
        perimeter_m: None,
        tags: relation.tags.clone(),
        version: relation.info.version,
        changeset: relation.info.changeset,
        timestamp: relation.info.timestamp.clone(),
        node_count: 0,
        node_ids: Vec::new(),
    }
}

// A literal "Unnamed" tag is indistinguishable from a missing one once
// persisted, so it is normalized to `None` here as well.
fn name_from_tags(tags: &Tags) -> Option<String> {
    tags.get("name").filter(|name| name.as_str() != UNNAMED).cloned()
}

/// Component-wise arithmetic mean; `None` for empty geometry.
fn centroid_of(coordinates: &[Coordinates]) -> Option<Coordinates> {
    if coordinates.is_empty() {
        return None;
    }
    let count = coordinates.len() as f64;
    let lat = coordinates.iter().map(|c| c.lat).sum::<f64>() / count;
    let lon = coordinates.iter().map(|c| c.lon).sum::<f64>() / count;
    Some(Coordinates { lat, lon })
}

fn parse_area_tag(tags: &Tags) -> Option<f64> {
    tags.get("area").and_then(|value| value.parse().ok())
}
