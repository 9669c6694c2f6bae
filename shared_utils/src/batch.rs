//! Batch Processing Module
//!
//! File collection for folder inputs and success/failure accounting for a
//! batch of independent jobs.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect regular files under `dir` whose extension is in `extensions`
/// (case-insensitive). Non-recursive mode only looks at direct children.
pub fn collect_files(dir: &Path, extensions: &[&str], recursive: bool) -> Vec<PathBuf> {
    let walker = if recursive {
        WalkDir::new(dir).follow_links(true)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| crate::common_utils::has_extension(e.path(), extensions))
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// [`collect_files`] in path order, so previews and logs are stable between
/// runs.
pub fn collect_files_sorted(dir: &Path, extensions: &[&str], recursive: bool) -> Vec<PathBuf> {
    let mut files = collect_files(dir, extensions, recursive);
    files.sort();
    files
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_collect_files_filters_extensions() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("b.EXR"));
        touch(&dir.path().join("c.txt"));

        let mut files = collect_files(dir.path(), &["png", "exr"], true);
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.png"));
        assert!(files[1].ends_with("b.EXR"));
    }

    #[test]
    fn test_collect_files_non_recursive_skips_subfolders() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("top.png"));
        touch(&dir.path().join("sub/nested.png"));

        assert_eq!(collect_files(dir.path(), &["png"], false).len(), 1);
        assert_eq!(collect_files(dir.path(), &["png"], true).len(), 2);
    }

    #[test]
    fn test_collect_files_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_files(dir.path(), &["png"], true).is_empty());
    }

    #[test]
    fn test_collect_files_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("c.png"));
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("b.png"));

        let files = collect_files_sorted(dir.path(), &["png"], true);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_batch_result_mixed() {
        let mut result = BatchResult::new();
        result.success();
        result.success();
        result.fail(PathBuf::from("wood_disp.exr"), "exit code 1".to_string());
        result.skip();

        assert_eq!(result.total, 4);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert!(result.has_failures());
        assert_eq!(result.errors[0].1, "exit code 1");
    }

    #[test]
    fn test_success_rate() {
        let empty = BatchResult::new();
        assert!((empty.success_rate() - 100.0).abs() < 0.01);

        let mut result = BatchResult::new();
        result.success();
        result.fail(PathBuf::from("t.png"), "E".to_string());
        assert!((result.success_rate() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_total_equals_sum() {
        let mut result = BatchResult::new();
        for _ in 0..3 {
            result.success();
        }
        result.fail(PathBuf::from("f1.png"), "E".to_string());
        result.skip();

        assert_eq!(
            result.total,
            result.succeeded + result.failed + result.skipped,
            "total must equal succeeded + failed + skipped"
        );
    }
}
