use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::osm::Tags;

/// Sentinel written to the persisted forms when a feature carries no name tag.
pub const UNNAMED: &str = "Unnamed";

/// Geographic coordinates. Persisted as a `[lat, lon]` pair.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, Copy, PartialEq)]
#[archive(check_bytes)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Serialize for Coordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.lat, self.lon).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (lat, lon) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Coordinates { lat, lon })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize,
         Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[archive(check_bytes)]
#[serde(rename_all = "snake_case")]
pub enum GreenSpaceType {
    Park,
    Forest,
    Garden,
    NatureReserve,
    Meadow,
    Grassland,
    Wood,
    RecreationGround,
    Other,
}

impl GreenSpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GreenSpaceType::Park => "park",
            GreenSpaceType::Forest => "forest",
            GreenSpaceType::Garden => "garden",
            GreenSpaceType::NatureReserve => "nature_reserve",
            GreenSpaceType::Meadow => "meadow",
            GreenSpaceType::Grassland => "grassland",
            GreenSpaceType::Wood => "wood",
            GreenSpaceType::RecreationGround => "recreation_ground",
            GreenSpaceType::Other => "other",
        }
    }
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize,
         Debug, Clone, Copy, PartialEq, Eq)]
#[archive(check_bytes)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Way,
    Relation,
}

/// One extracted green space. Built only by the geometry assembly pass and
/// immutable afterwards. Field names match the persisted JSON schema.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize,
         Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct GreenSpace {
    pub osm_id: u64,
    pub osm_type: OsmType,
    /// `None` when the source feature has no name tag. The persisted forms
    /// write the "Unnamed" sentinel instead, so a feature literally named
    /// "Unnamed" reads back as `None` as well.
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub name: Option<String>,
    pub space_type: GreenSpaceType,
    pub centroid: Option<Coordinates>,
    /// Resolved vertex coordinates in source-declared order. May be shorter
    /// than `node_ids` when references dangle, and is empty for relations.
    pub coordinates: Vec<Coordinates>,
    pub area_sq_m: Option<f64>,
    pub perimeter_m: Option<f64>,
    pub tags: Tags,
    pub version: u32,
    pub changeset: u64,
    pub timestamp: String,
    pub node_count: u64,
    pub node_ids: Vec<u64>,
}

impl GreenSpace {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_natural(&self) -> bool {
        matches!(
            self.space_type,
            GreenSpaceType::Forest
                | GreenSpaceType::Wood
                | GreenSpaceType::Meadow
                | GreenSpaceType::Grassland
        )
    }

    pub fn is_recreational(&self) -> bool {
        matches!(
            self.space_type,
            GreenSpaceType::Park | GreenSpaceType::Garden | GreenSpaceType::RecreationGround
        )
    }

    pub fn get_tag(&self, key: &str, default: &str) -> String {
        self.tags.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }
}

fn serialize_name<S: Serializer>(name: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(name.as_deref().unwrap_or(UNNAMED))
}

fn deserialize_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(if name == UNNAMED { None } else { Some(name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(name: Option<&str>, space_type: GreenSpaceType) -> GreenSpace {
        GreenSpace {
            osm_id: 7,
            osm_type: OsmType::Way,
            name: name.map(|n| n.to_string()),
            space_type,
            centroid: Some(Coordinates { lat: 0.5, lon: 0.5 }),
            coordinates: vec![
                Coordinates { lat: 0.0, lon: 0.0 },
                Coordinates { lat: 1.0, lon: 1.0 },
            ],
            area_sq_m: None,
            perimeter_m: None,
            tags: Tags::new(),
            version: 2,
            changeset: 11,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            node_count: 2,
            node_ids: vec![1, 2],
        }
    }

    #[test]
    fn coordinates_serialize_as_pair() {
        let value = serde_json::to_value(Coordinates { lat: 52.5, lon: -1.9 }).unwrap();
        assert_eq!(value, serde_json::json!([52.5, -1.9]));
    }

    #[test]
    fn coordinates_deserialize_from_pair() {
        let coords: Coordinates = serde_json::from_str("[52.5, -1.9]").unwrap();
        assert_eq!(coords, Coordinates { lat: 52.5, lon: -1.9 });
    }

    #[test]
    fn missing_name_serializes_as_sentinel() {
        let value = serde_json::to_value(space(None, GreenSpaceType::Wood)).unwrap();
        assert_eq!(value["name"], serde_json::json!("Unnamed"));
        assert_eq!(value["osm_type"], serde_json::json!("way"));
        assert_eq!(value["space_type"], serde_json::json!("wood"));
    }

    #[test]
    fn sentinel_name_deserializes_as_none() {
        let json = serde_json::to_string(&space(None, GreenSpaceType::Wood)).unwrap();
        let parsed: GreenSpace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, None);
        assert!(!parsed.has_name());
        assert_eq!(parsed.display_name(), UNNAMED);
    }

    #[test]
    fn named_space_round_trips() {
        let original = space(Some("Cannon Hill Park"), GreenSpaceType::Park);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: GreenSpace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
        assert!(parsed.has_name());
    }

    #[test]
    fn natural_and_recreational_split() {
        assert!(space(None, GreenSpaceType::Wood).is_natural());
        assert!(!space(None, GreenSpaceType::Wood).is_recreational());
        assert!(space(None, GreenSpaceType::Garden).is_recreational());
        assert!(!space(None, GreenSpaceType::Garden).is_natural());
        assert!(!space(None, GreenSpaceType::Other).is_natural());
        assert!(!space(None, GreenSpaceType::Other).is_recreational());
    }
}
