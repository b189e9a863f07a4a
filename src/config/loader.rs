use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::PhpInspectConfig;
use crate::core::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".phpinspect.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Read the raw contents of a config file
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<PhpInspectConfig> {
    let config = toml::from_str::<PhpInspectConfig>(contents).map_err(|e| {
        Error::Configuration(format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))
    })?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly requested config file. Unlike discovery, every
/// failure is an error.
pub fn load_config_from(path: &Path) -> Result<PhpInspectConfig> {
    let contents = read_config_file(path).map_err(|e| Error::io_at(path, e))?;
    let config = parse_and_validate_config(&contents)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try loading config from a specific path; a missing or invalid file
/// yields `None`.
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<PhpInspectConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{} in {}. Using defaults.", e, config_path.display());
            None
        }
    }
}

/// Only actual errors are logged, not "file not found"
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory ancestors of `start`, itself included, up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for `.phpinspect.toml`.
pub fn discover_config(start: PathBuf) -> Option<PhpInspectConfig> {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
}

pub fn load_config() -> PhpInspectConfig {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return PhpInspectConfig::default();
        }
    };

    discover_config(current).unwrap_or_else(|| {
        log::debug!(
            "No config found after checking {} directories. Using default config.",
            MAX_TRAVERSAL_DEPTH
        );
        PhpInspectConfig::default()
    })
}
