use std::collections::HashMap;

/// Tags of a single OSM element. Keys are unique; values are kept verbatim.
pub type Tags = HashMap<String, String>;

/// Authorship metadata shared by ways and relations.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub version: u32,
    pub changeset: u64,
    pub timestamp: String,
}

impl Default for ElementInfo {
    fn default() -> Self {
        ElementInfo {
            version: 1,
            changeset: 0,
            timestamp: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: u64,
    /// Node ids in source-declared order. Ids may dangle: a referenced node is
    /// not guaranteed to exist in the same extract.
    pub node_refs: Vec<u64>,
    pub tags: Tags,
    pub info: ElementInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: u64,
    pub tags: Tags,
    pub info: ElementInfo,
}

/// One record of the source dataset. Ids are unique per variant, not globally.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}
