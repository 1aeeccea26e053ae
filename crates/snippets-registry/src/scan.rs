use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::slice;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::ConfigurationError;

/// Matches library files by exact extension.
///
/// Backends look libraries up as `<name>.<extension>`, so a file whose
/// extension differs only in case is not a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    pub fn new(extension: impl AsRef<str>) -> Self {
        Self {
            extension: extension.as_ref().trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map(|ext| ext == self.extension)
            .unwrap_or(false)
    }
}

/// Walks a fixed set of roots for library files.
///
/// The scanner holds no traversal state, so [`PathScanner::scan`] can be
/// called again to restart from the first root. Links are not followed into
/// directories.
#[derive(Debug, Clone)]
pub struct PathScanner {
    roots: Vec<PathBuf>,
    filter: ExtensionFilter,
    max_depth: Option<usize>,
}

impl PathScanner {
    pub fn new(roots: Vec<PathBuf>, filter: ExtensionFilter) -> Self {
        Self {
            roots,
            filter,
            max_depth: None,
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    /// Lazily yields absolute paths of matching files, root by root.
    ///
    /// A root that is not an existing directory produces a single
    /// [`ConfigurationError::MissingRoot`] item; iteration then carries on with
    /// the next root, so stopping there is up to the caller.
    pub fn scan(&self) -> Scan<'_> {
        Scan {
            scanner: self,
            roots: self.roots.iter(),
            walker: None,
            current_root: None,
        }
    }

    fn walker(&self, root: &Path) -> walkdir::IntoIter {
        let mut walk = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walk = walk.max_depth(depth);
        }
        walk.into_iter()
    }
}

pub struct Scan<'a> {
    scanner: &'a PathScanner,
    roots: slice::Iter<'a, PathBuf>,
    walker: Option<walkdir::IntoIter>,
    current_root: Option<PathBuf>,
}

impl Iterator for Scan<'_> {
    type Item = Result<PathBuf, ConfigurationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(walker) = self.walker.as_mut() {
                match walker.next() {
                    Some(Ok(entry)) => {
                        let path = entry.path();
                        if path.is_file() && self.scanner.filter.matches(path) {
                            return Some(Ok(entry.into_path()));
                        }
                        continue;
                    }
                    Some(Err(err)) => {
                        if let Some(root) = &self.current_root {
                            debug!("skipping entry while scanning {}: {}", root.display(), err);
                        }
                        continue;
                    }
                    None => {
                        self.walker = None;
                        self.current_root = None;
                    }
                }
            }

            let root = self.roots.next()?;
            match fs::canonicalize(root) {
                Ok(absolute) if absolute.is_dir() => {
                    debug!("scanning library root {}", absolute.display());
                    self.walker = Some(self.scanner.walker(&absolute));
                    self.current_root = Some(absolute);
                }
                _ => return Some(Err(ConfigurationError::MissingRoot(root.clone()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    #[test]
    fn scan_recurses_and_filters_by_extension() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("solidify.py"));
        touch(&dir.path().join("nested/deeper/align_components.py"));
        touch(&dir.path().join("nested/solidify_old.PY"));
        touch(&dir.path().join("nested/readme.txt"));
        touch(&dir.path().join("common.pyc"));

        let scanner = PathScanner::new(vec![dir.path().to_path_buf()], ExtensionFilter::new(".py"));
        let found: Vec<_> = scanner.scan().collect::<Result<_, _>>().unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["align_components.py", "solidify.py"]);
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn missing_root_is_reported_and_scan_continues() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present");
        touch(&present.join("a.py"));
        let missing = dir.path().join("missing");

        let scanner = PathScanner::new(
            vec![missing.clone(), present.clone()],
            ExtensionFilter::new("py"),
        );
        let items: Vec<_> = scanner.scan().collect();
        assert_eq!(items.len(), 2);
        match &items[0] {
            Err(ConfigurationError::MissingRoot(root)) => assert_eq!(root, &missing),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(items[1].as_ref().unwrap().ends_with("a.py"));
    }

    #[test]
    fn scan_is_restartable() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.py"));
        touch(&dir.path().join("b.py"));
        let scanner = PathScanner::new(vec![dir.path().to_path_buf()], ExtensionFilter::new("py"));
        let first: Vec<_> = scanner.scan().map(Result::unwrap).collect();
        let second: Vec<_> = scanner.scan().map(Result::unwrap).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn max_depth_limits_recursion() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("top.py"));
        touch(&dir.path().join("a/b/deep.py"));
        let scanner = PathScanner::new(vec![dir.path().to_path_buf()], ExtensionFilter::new("py"))
            .max_depth(1);
        let found: Vec<_> = scanner.scan().map(Result::unwrap).collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("top.py"));
    }
}
