//! On-disk suffix renaming
//!
//! Renames source textures that carry no color-space token to
//! `<stem>_<space>.<ext>` so later conversions (and other tools) see an
//! explicit label.

use crate::color_space::{determine_color_space, has_color_space_token};
use crate::error::{Result, TxError};
use crate::formats::is_source_extension;
use crate::intake::gather_textures;
use crate::settings::ConversionSettings;
use serde::Serialize;
use shared_utils::check_dangerous_directory;
use shared_utils::common_utils::{file_stem_string, get_extension_lowercase};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameReport {
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Not a source texture, or already labeled.
    pub skipped: Vec<PathBuf>,
    /// Input list with renamed entries replaced by their new paths.
    pub updated: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

impl RenameReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn rename_one(path: &Path, tif_srgb: bool) -> Result<Option<PathBuf>> {
    if !is_source_extension(&get_extension_lowercase(path)) {
        return Ok(None);
    }
    if has_color_space_token(&file_stem_string(path)) {
        return Ok(None);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        check_dangerous_directory(parent)?;
    }

    let target = determine_color_space(path, tif_srgb).suggested_path;
    if target.exists() {
        return Err(TxError::RenameConflict(target));
    }

    fs::rename(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "Renamed texture");
    Ok(Some(target))
}

/// Rename every unlabeled texture in `paths`.
pub fn add_missing_suffixes(paths: &[PathBuf], tif_srgb: bool) -> RenameReport {
    let mut report = RenameReport::default();

    for path in paths {
        match rename_one(path, tif_srgb) {
            Ok(Some(target)) => {
                report.renamed.push((path.clone(), target.clone()));
                report.updated.push(target);
            }
            Ok(None) => {
                report.skipped.push(path.clone());
                report.updated.push(path.clone());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Rename failed");
                report.errors.push((path.clone(), e.to_string()));
                report.updated.push(path.clone());
            }
        }
    }

    report
}

/// Folder variant: refuses protected folders up front and re-scans after
/// renaming, so `updated` reflects what is on disk.
pub fn rename_folder(folder: &Path, recursive: bool, tif_srgb: bool) -> Result<RenameReport> {
    check_dangerous_directory(folder)?;
    let textures = gather_textures(folder, recursive)?;
    let mut report = add_missing_suffixes(&textures, tif_srgb);
    report.updated = gather_textures(folder, recursive)?;
    Ok(report)
}

/// The rename step of a conversion run. With `add_suffix` set (and not a dry
/// run) sources are labeled on disk first, `folder` selecting the re-scanning
/// variant; otherwise `updated` is `files` unchanged.
pub fn label_sources(
    files: &[PathBuf],
    folder: Option<&Path>,
    settings: &ConversionSettings,
) -> Result<RenameReport> {
    if !settings.add_suffix || settings.dry_run {
        return Ok(RenameReport {
            updated: files.to_vec(),
            ..RenameReport::default()
        });
    }
    match folder {
        Some(folder) => rename_folder(folder, settings.recursive, settings.tif_srgb),
        None => Ok(add_missing_suffixes(files, settings.tif_srgb)),
    }
}
