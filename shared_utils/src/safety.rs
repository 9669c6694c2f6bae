//! Safety Module
//!
//! Guards destructive operations (in-place renames) against system
//! directories and home roots.

use std::path::Path;
use thiserror::Error;

const DANGEROUS_DIRS: &[&str] = &[
    "/",
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/Library",
    "/Applications",
    "/Users",
    "/home",
    "/root",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/opt",
    "C:\\",
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\Users",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafetyError {
    #[error("refusing to modify protected system directory '{0}'")]
    ProtectedDirectory(String),

    #[error("refusing to modify '{0}': too close to a home directory root, pick a subfolder")]
    HomeRoot(String),
}

fn normalize(path_str: &str) -> String {
    let trimmed = path_str.trim_end_matches(|c: char| c == '/' || c == '\\');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.len() == 2 && trimmed.ends_with(':') {
        // "C:" and "C:\" both mean the drive root
        format!("{}\\", trimmed)
    } else {
        trimmed.to_string()
    }
}

pub fn check_dangerous_directory(path: &Path) -> Result<(), SafetyError> {
    let raw = path.to_string_lossy();
    let normalized = normalize(&raw);

    if DANGEROUS_DIRS
        .iter()
        .any(|d| d.eq_ignore_ascii_case(&normalized))
    {
        return Err(SafetyError::ProtectedDirectory(path.display().to_string()));
    }

    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let canonical_str = canonical.to_string_lossy();
    let depth = canonical.components().count();

    if (canonical_str.starts_with("/Users/") || canonical_str.starts_with("/home/")) && depth <= 3 {
        return Err(SafetyError::HomeRoot(path.display().to_string()));
    }

    Ok(())
}
