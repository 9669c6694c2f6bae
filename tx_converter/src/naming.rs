//! Output naming
//!
//! Decides the stem of a converted texture (plain, with a color-space
//! suffix, or renamed to ACEScg) and where the file is written.

use crate::color_space::{ends_with_color_space_suffix, strip_color_space_suffix, ColorSpace};
use crate::error::{Result, TxError};
use crate::formats::TargetFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const ACESCG_SUFFIX: &str = "_acescg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// Keep the source stem.
    #[default]
    Keep,
    /// Append `_<space>` when the stem has no trailing space suffix.
    AddSuffix,
    /// Replace a trailing space suffix with `_acescg`.
    AcesCg,
}

impl NamingMode {
    /// ACEScg renaming takes precedence over suffixing.
    pub fn from_flags(add_suffix: bool, rename_to_acescg: bool) -> Self {
        if rename_to_acescg {
            NamingMode::AcesCg
        } else if add_suffix {
            NamingMode::AddSuffix
        } else {
            NamingMode::Keep
        }
    }
}

pub fn output_stem(stem: &str, color_space: ColorSpace, mode: NamingMode) -> String {
    match mode {
        NamingMode::Keep => stem.to_string(),
        NamingMode::AddSuffix if ends_with_color_space_suffix(stem) => stem.to_string(),
        NamingMode::AddSuffix => format!("{}{}", stem, color_space.suffix()),
        NamingMode::AcesCg => format!("{}{}", strip_color_space_suffix(stem), ACESCG_SUFFIX),
    }
}

/// Full output path for `source`.
///
/// Without `output_dir` the texture lands next to its source. With it, the
/// source directory's position below `base_dir` is mirrored; sources outside
/// `base_dir` (or with no base) go straight into `output_dir`.
pub fn output_path(
    source: &Path,
    stem: &str,
    target: TargetFormat,
    output_dir: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<PathBuf> {
    let source_dir = source.parent().unwrap_or_else(|| Path::new(""));

    let dir = match output_dir {
        None => source_dir.to_path_buf(),
        Some(out) => {
            let relative = base_dir
                .and_then(|base| source_dir.strip_prefix(base).ok())
                .unwrap_or_else(|| Path::new(""));
            out.join(relative)
        }
    };

    let path = dir.join(format!("{}.{}", stem, target.extension()));
    if path == source {
        return Err(TxError::OutputConflict(path));
    }
    Ok(path)
}
