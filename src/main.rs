mod cache;
mod data;
mod errors;
mod extract;
mod manager;
mod source;

use std::fs::File;
use std::io;
use std::path::Path;

use log::info;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::errors::Result;
use crate::manager::GreenSpaceManager;
use crate::source::xml::OsmXmlSource;

#[derive(Deserialize)]
pub struct UserConfig {
    pub data_path: String,
    pub cache_dir: String,
    pub use_cache: bool,
    pub force_refresh: bool,
}

fn load_user_config(path: &str) -> UserConfig {
    let file = File::open(path).expect("Could not open config file.");
    serde_json::from_reader(file).expect("Could not parse config.")
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = load_user_config(&config_path);

    let manager = GreenSpaceManager::new(Path::new(&config.cache_dir), config.use_cache)?;
    let source = OsmXmlSource::new(config.data_path.as_str());
    let spaces = manager.get_green_spaces(&config.data_path, &source, config.force_refresh)?;

    info!(count = spaces.len(); "Found green spaces");
    for space in spaces.iter().take(5) {
        info!(
            osm_id = space.osm_id,
            name = space.display_name(),
            space_type = space.space_type.as_str(),
            has_name = space.has_name(),
            is_natural = space.is_natural(),
            is_recreational = space.is_recreational(),
            node_count = space.node_count,
            centroid = space
                .centroid
                .map(|centroid| centroid.to_string())
                .unwrap_or_default();
            "Green space"
        );
        if space.has_tag("operator") {
            info!(
                name = space.display_name(),
                operator = space.get_tag("operator", "").as_str();
                "Operated green space"
            );
        }
    }

    let cache_info = manager.cache_info(&config.data_path);
    info!(
        json_cache = cache_info.json_cache_exists,
        binary_cache = cache_info.binary_cache_exists;
        "Cache status"
    );

    Ok(())
}
