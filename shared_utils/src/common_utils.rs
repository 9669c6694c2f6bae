//! Common Utilities Module
//!
//! Small path and string helpers shared by the collectors, the adapters and
//! the logging layer.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;

// ═══════════════════════════════════════════════════════════════
// Paths
// ═══════════════════════════════════════════════════════════════

/// Lower-cased extension without the dot, or an empty string.
///
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::get_extension_lowercase;
///
/// assert_eq!(get_extension_lowercase(Path::new("wood_diff.TIF")), "tif");
/// assert_eq!(get_extension_lowercase(Path::new("noext")), "");
/// ```
pub fn get_extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Case-insensitive extension membership test. `extensions` carry no dot.
///
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::has_extension;
///
/// assert!(has_extension(Path::new("rock.EXR"), &["exr", "png"]));
/// assert!(!has_extension(Path::new("rock.tx"), &["exr", "png"]));
/// ```
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = get_extension_lowercase(path);
    extensions.contains(&ext.as_str())
}

pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// File stem as an owned string (lossy), empty when the path has none.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

// ═══════════════════════════════════════════════════════════════
// Strings
// ═══════════════════════════════════════════════════════════════

/// Render a program and its arguments the way a user would type them.
/// Arguments containing whitespace are double-quoted.
///
/// ```
/// use shared_utils::common_utils::format_command_string;
///
/// let cmd = format_command_string("maketx", &["--colorconvert", "lin_srgb", "ACES - ACEScg"]);
/// assert_eq!(cmd, "maketx --colorconvert lin_srgb \"ACES - ACEScg\"");
/// ```
pub fn format_command_string<S: AsRef<OsStr>>(command: &str, args: &[S]) -> String {
    let mut out = command.to_string();
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        out.push(' ');
        if arg.is_empty() || arg.chars().any(char::is_whitespace) {
            out.push('"');
            out.push_str(&arg);
            out.push('"');
        } else {
            out.push_str(&arg);
        }
    }
    out
}

/// Keep the last `max_lines` lines of tool output for error messages.
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
