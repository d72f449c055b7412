use std::path::{Path, PathBuf};

pub const FIGHTERS_FILE: &str = "fighter_details.csv";
pub const EVENTS_FILE: &str = "event_details.csv";
pub const FIGHTS_FILE: &str = "fight_details.csv";
pub const BOUTS_FILE: &str = "UFC.csv";
pub const LOCATIONS_FILE: &str = "locations_coordinates.csv";

/// Locations of the five source files.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub fighters: PathBuf,
    pub events: PathBuf,
    pub fights: PathBuf,
    pub bouts: PathBuf,
    pub locations: PathBuf,
}

impl DataPaths {
    /// The standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        DataPaths {
            fighters: dir.join(FIGHTERS_FILE),
            events: dir.join(EVENTS_FILE),
            fights: dir.join(FIGHTS_FILE),
            bouts: dir.join(BOUTS_FILE),
            locations: dir.join(LOCATIONS_FILE),
        }
    }
}
