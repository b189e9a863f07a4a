use serde::{Deserialize, Serialize};

use crate::core::{Error, InspectionKind, QualifiedName, Result};
use crate::inspections::db_call_pattern::DEFAULT_HANDLE_TYPE;
use crate::inspections::HandleTypes;
use crate::io::output::OutputFormat;

/// Root configuration structure for phpinspect
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PhpInspectConfig {
    /// Which inspections run
    #[serde(default)]
    pub inspections: InspectionsConfig,

    /// Database handle recognition
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Ignore patterns
    #[serde(default)]
    pub ignore: Option<IgnoreConfig>,

    /// Output configuration
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl PhpInspectConfig {
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        if let Some(ignore) = &self.ignore {
            ignore.validate()?;
        }
        Ok(())
    }

    pub fn handle_types(&self) -> HandleTypes {
        self.database.handle_types()
    }

    pub fn ignore_patterns(&self) -> Vec<String> {
        self.ignore
            .as_ref()
            .map(|ignore| ignore.patterns.clone())
            .unwrap_or_default()
    }

    pub fn default_format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|output| output.default_format)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionsConfig {
    #[serde(default = "default_enabled")]
    pub interface_redeclaration: bool,

    #[serde(default = "default_enabled")]
    pub db_call_pattern: bool,
}

impl Default for InspectionsConfig {
    fn default() -> Self {
        Self {
            interface_redeclaration: default_enabled(),
            db_call_pattern: default_enabled(),
        }
    }
}

impl InspectionsConfig {
    pub fn is_enabled(&self, kind: InspectionKind) -> bool {
        match kind {
            InspectionKind::InterfaceRedeclaration => self.interface_redeclaration,
            InspectionKind::DbCallPattern => self.db_call_pattern,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Fully-qualified class names treated as database handles
    #[serde(default = "default_handle_types")]
    pub handle_types: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            handle_types: default_handle_types(),
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.handle_types.is_empty() {
            return Err(Error::Validation(
                "database.handle_types must name at least one class".to_string(),
            ));
        }
        for name in &self.handle_types {
            let trimmed = name.trim();
            if trimmed.trim_start_matches('\\').is_empty() {
                return Err(Error::Validation(
                    "database.handle_types contains an empty class name".to_string(),
                ));
            }
            if !trimmed.starts_with('\\') {
                return Err(Error::Validation(format!(
                    "database.handle_types entry '{trimmed}' must be fully qualified (e.g. '\\{trimmed}')"
                )));
            }
        }
        Ok(())
    }

    pub fn handle_types(&self) -> HandleTypes {
        HandleTypes::new(self.handle_types.iter().map(QualifiedName::new))
    }
}

fn default_handle_types() -> Vec<String> {
    vec![DEFAULT_HANDLE_TYPE.to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IgnoreConfig {
    /// Glob patterns for files to skip
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl IgnoreConfig {
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.patterns {
            glob::Pattern::new(pattern)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
}
