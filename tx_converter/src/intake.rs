//! Texture intake
//!
//! Folder scanning, dropped-file filtering and the grouped "load textures"
//! preview.

use crate::color_space::{determine_color_space, ColorSpace};
use crate::error::{Result, TxError};
use crate::formats::{is_converted_extension, SOURCE_EXTENSIONS};
use serde::Serialize;
use shared_utils::common_utils::{file_name_string, get_extension_lowercase, is_hidden_file};
use shared_utils::collect_files_sorted;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Space → extension → files.
pub type TextureGroups = BTreeMap<ColorSpace, BTreeMap<String, Vec<PathBuf>>>;

/// Source textures under `folder`, sorted by path. Hidden files (including
/// `._name` resource forks) are ignored.
pub fn gather_textures(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(TxError::InputNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(TxError::NotADirectory(folder.to_path_buf()));
    }

    let files: Vec<PathBuf> = collect_files_sorted(folder, SOURCE_EXTENSIONS, recursive)
        .into_iter()
        .filter(|p| !is_hidden_file(p))
        .filter(|p| !is_converted_extension(&get_extension_lowercase(p)))
        .collect();

    debug!(folder = %folder.display(), count = files.len(), recursive, "Gathered textures");
    Ok(files)
}

/// Filter an explicit file list the way the drop target did: missing paths
/// are dropped, folders are expanded.
pub fn collect_dropped(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_file() {
            out.push(path.clone());
        } else if path.is_dir() {
            match gather_textures(path, recursive) {
                Ok(found) => out.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping dropped folder"),
            }
        } else {
            warn!(path = %path.display(), "Dropped path does not exist, ignoring");
        }
    }
    out
}

pub fn group_textures(paths: &[PathBuf], tif_srgb: bool) -> TextureGroups {
    let mut groups = TextureGroups::new();
    for path in paths {
        let cs = determine_color_space(path, tif_srgb).color_space;
        groups
            .entry(cs)
            .or_default()
            .entry(get_extension_lowercase(path))
            .or_default()
            .push(path.clone());
    }
    groups
}

pub fn count_grouped(groups: &TextureGroups) -> usize {
    groups
        .values()
        .flat_map(|by_ext| by_ext.values())
        .map(Vec::len)
        .sum()
}

/// Plain-text preview:
///
/// ```text
/// RAW:
///   .PNG:
///     - wall_normal.png
///
/// Total Textures to Convert: 1
/// ```
pub fn render_groups(groups: &TextureGroups) -> String {
    let mut out = String::new();
    for (cs, by_ext) in groups {
        let _ = writeln!(out, "{}:", cs.as_str().to_uppercase());
        for (ext, files) in by_ext {
            let _ = writeln!(out, "  .{}:", ext.to_uppercase());
            for file in files {
                let _ = writeln!(out, "    - {}", file_name_string(file));
            }
            out.push('\n');
        }
    }
    let _ = write!(out, "Total Textures to Convert: {}", count_grouped(groups));
    out
}

#[derive(Debug, Serialize)]
pub struct ScanReport<'a> {
    pub total: usize,
    pub groups: &'a TextureGroups,
}

pub fn groups_to_json(groups: &TextureGroups) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ScanReport {
        total: count_grouped(groups),
        groups,
    })
}
