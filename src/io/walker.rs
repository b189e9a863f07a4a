use crate::analyzers::php::is_php_path;
use crate::core::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    root: PathBuf,
    ignore_patterns: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    /// Patterns that fail to compile are skipped; configuration validation
    /// reports them before a walk starts.
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns
            .iter()
            .filter_map(|pattern| glob::Pattern::new(pattern).ok())
            .collect();
        self
    }

    /// PHP files under the root, sorted. `.gitignore` rules apply.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        is_php_path(path) && !self.is_ignored(path)
    }

    /// Globs match either the path relative to the walk root or the full path.
    fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative) || pattern.matches_path(path))
    }
}

pub fn find_php_files(root: &Path, ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
    FileWalker::new(root.to_path_buf())
        .with_ignore_patterns(ignore_patterns.to_vec())
        .walk()
}
