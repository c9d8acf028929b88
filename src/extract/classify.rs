use std::collections::{HashMap, HashSet};

use crate::data::green::GreenSpaceType;
use crate::data::osm::Tags;

/// Decides whether a tag set describes a green space, and which kind.
///
/// Acceptance and categorization are two independent lookup structures: a
/// value can be recognized by an acceptance family without having an entry in
/// the category table (e.g. `landuse=grass`), in which case it categorizes as
/// `Other`.
pub struct Classifier {
    green_leisure: HashSet<&'static str>,
    green_landuse: HashSet<&'static str>,
    green_natural: HashSet<&'static str>,
    type_table: HashMap<&'static str, GreenSpaceType>,
}

impl Classifier {
    pub fn new() -> Classifier {
        Classifier {
            green_leisure: HashSet::from(["park", "garden", "nature_reserve", "recreation_ground"]),
            green_landuse: HashSet::from(["forest", "meadow", "grass", "recreation_ground", "orchard"]),
            green_natural: HashSet::from(["wood", "grassland", "heath"]),
            type_table: HashMap::from([
                ("park", GreenSpaceType::Park),
                ("forest", GreenSpaceType::Forest),
                ("garden", GreenSpaceType::Garden),
                ("nature_reserve", GreenSpaceType::NatureReserve),
                ("meadow", GreenSpaceType::Meadow),
                ("grassland", GreenSpaceType::Grassland),
                ("wood", GreenSpaceType::Wood),
                ("recreation_ground", GreenSpaceType::RecreationGround),
            ]),
        }
    }

    pub fn accepts(&self, tags: &Tags) -> bool {
        tags.get("leisure")
            .map_or(false, |value| self.green_leisure.contains(value.as_str()))
            || tags
                .get("landuse")
                .map_or(false, |value| self.green_landuse.contains(value.as_str()))
            || tags
                .get("natural")
                .map_or(false, |value| self.green_natural.contains(value.as_str()))
    }

    /// Keys are consulted in a fixed order, so a feature carrying conflicting
    /// family tags always resolves via `leisure` first.
    pub fn categorize(&self, tags: &Tags) -> GreenSpaceType {
        for key in ["leisure", "landuse", "natural"] {
            if let Some(value) = tags.get(key) {
                if let Some(space_type) = self.type_table.get(value.as_str()) {
                    return *space_type;
                }
            }
        }
        GreenSpaceType::Other
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new()
    }
}
