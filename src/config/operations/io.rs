use crate::config::types::LaunchConfig;
use crate::paths::PATH_DATA;

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, warn};

pub fn load_cfg() -> LaunchConfig {
    load_cfg_from(&PATH_DATA.join("settings.json"))
}

/// Read settings from `path`, falling back to defaults when the file is
/// missing or unreadable
pub fn load_cfg_from(path: &Path) -> LaunchConfig {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return LaunchConfig::default();
        }
    };

    match serde_json::from_reader::<_, LaunchConfig>(BufReader::new(file)) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed settings file");
            LaunchConfig::default()
        }
    }
}

pub fn save_cfg(config: &LaunchConfig) -> Result<(), Box<dyn Error>> {
    save_cfg_to(&PATH_DATA.join("settings.json"), config)
}

pub fn save_cfg_to(path: &Path, config: &LaunchConfig) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}
