//! Conversion settings shared by planning and dispatch.

use crate::formats::TargetFormat;
use crate::naming::NamingMode;
use serde::Serialize;
use std::path::PathBuf;

/// Worker count used when none is requested.
pub const DEFAULT_WORKERS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSettings {
    pub target: TargetFormat,
    /// DWAA compression for non-displacement maps.
    pub compression: bool,
    pub add_suffix: bool,
    pub rename_to_acescg: bool,
    /// Promote color maps to float.
    pub hdri: bool,
    /// Untagged TIFFs are sRGB textures (otherwise linear).
    pub tif_srgb: bool,
    pub recursive: bool,
    /// Parallel converters; 0 picks from the core count.
    pub jobs: usize,
    /// Reconvert even when the output is newer than the source.
    pub force: bool,
    pub dry_run: bool,
    pub output_dir: Option<PathBuf>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            target: TargetFormat::Tx,
            compression: true,
            add_suffix: false,
            rename_to_acescg: false,
            hdri: false,
            tif_srgb: true,
            recursive: true,
            jobs: DEFAULT_WORKERS,
            force: false,
            dry_run: false,
            output_dir: None,
        }
    }
}

impl ConversionSettings {
    pub fn naming_mode(&self) -> NamingMode {
        NamingMode::from_flags(self.add_suffix, self.rename_to_acescg)
    }
}
