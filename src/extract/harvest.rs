use std::collections::{HashMap, HashSet};

use crate::data::green::Coordinates;
use crate::data::osm::Element;
use crate::errors::Result;
use crate::source::OsmSource;

/// Pass 2: coordinates for exactly the nodes named in `needed`. All other
/// nodes are discarded as they stream past, so memory stays proportional to
/// the matched subset rather than the dataset. The id set is consumed and
/// freed when this pass returns.
///
/// Ids in `needed` without a node in the source are simply absent from the
/// result; the assembly pass tolerates that.
pub fn harvest_coordinates<S: OsmSource>(
    source: &S,
    needed: HashSet<u64>,
) -> Result<HashMap<u64, Coordinates>> {
    let mut coords: HashMap<u64, Coordinates> = HashMap::new();

    for item in tqdm::tqdm(source.stream()?) {
        match item? {
            Element::Node(node) => {
                if needed.contains(&node.id) {
                    coords.insert(node.id, Coordinates { lat: node.lat, lon: node.lon });
                }
            },
            Element::Way(_) | Element::Relation(_) => (),
        }
    }

    Ok(coords)
}
