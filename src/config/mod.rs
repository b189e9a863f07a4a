//! `.phpinspect.toml` configuration.

mod core;
mod loader;

pub use self::core::{
    DatabaseConfig, IgnoreConfig, InspectionsConfig, OutputConfig, PhpInspectConfig,
};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};

/// Contents written by `phpinspect init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# phpinspect configuration

[inspections]
# A class re-implements an interface an ancestor already provides.
interface_redeclaration = true
# prepare()/execute() chains and unread query() results on database handles.
db_call_pattern = true

[database]
# Fully-qualified classes treated as database handles. Classes declared as
# extending one of these are recognized too.
handle_types = ['\PDO']

[ignore]
patterns = ["vendor/**"]

[output]
# terminal, json or annotated
default_format = "terminal"
"#;
