//! Language front-ends. Each one lowers source text into [`crate::core::ParsedFile`].

pub mod php;

pub use php::{is_php_path, PhpAnalyzer, PHP_EXTENSIONS};
