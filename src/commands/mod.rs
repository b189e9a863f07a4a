//! CLI command implementations.
//!
//! - **analyze**: run the inspections over files and directories
//! - **verify**: check fixture files with inline diagnostic markers
//! - **init**: write a default `.phpinspect.toml`

pub mod analyze;
pub mod init;
pub mod verify;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use init::init_config;
pub use verify::{handle_verify, VerifyConfig};

use crate::config::{self, PhpInspectConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// An explicit `--config` must load; otherwise discovery falls back to defaults.
pub(crate) fn resolve_config(explicit: Option<&Path>) -> Result<PhpInspectConfig> {
    match explicit {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(config::load_config()),
    }
}
