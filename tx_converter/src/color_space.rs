//! Color-Space Labeler
//!
//! Guesses the color space of a texture from its file name and extension,
//! using the suffix vocabulary the converters understand:
//! `_raw` (non-color data), `_srgb_texture` (display-referred color) and
//! `_lin_srgb` (scene-linear color).

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_utils::common_utils::{file_stem_string, get_extension_lowercase};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    Raw,
    SrgbTexture,
    LinSrgb,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 3] = [ColorSpace::Raw, ColorSpace::SrgbTexture, ColorSpace::LinSrgb];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpace::Raw => "raw",
            ColorSpace::SrgbTexture => "srgb_texture",
            ColorSpace::LinSrgb => "lin_srgb",
        }
    }

    /// Filename suffix, e.g. `_lin_srgb`.
    pub fn suffix(&self) -> String {
        format!("_{}", self.as_str())
    }

    /// Extra maketx options implied by the space.
    pub fn additional_options(&self) -> &'static str {
        match self {
            ColorSpace::Raw => "-d float",
            ColorSpace::SrgbTexture | ColorSpace::LinSrgb => "",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of labeling one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorSpaceGuess {
    pub color_space: ColorSpace,
    pub additional_options: &'static str,
    /// The path with the space suffix inserted, or the input path when the
    /// name already carries a token.
    pub suggested_path: PathBuf,
}

fn raw_data_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"_depth|_disp|_displacement|_zdisp|_normal|_nrm|_norm|_n(?:[^a-z]|$)|_mask|_rough|_metal",
            r"|_gloss|_spec|_ao|_cavity|_bump|_height|_opacity|_roughness|_r(?:[^a-z]|$)|_roughnes",
            r"|_specularity|_specs|_metalness|_metalnes",
        ))
        .expect("raw data pattern is valid")
    })
}

fn trailing_suffix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(_raw|_srgb_texture|_lin_srgb)$").expect("suffix pattern is valid")
    })
}

fn displacement_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)_disp|_displacement|_zdisp").expect("displacement pattern is valid")
    })
}

/// Token carried anywhere in the stem, case-insensitive.
pub fn find_color_space_token(stem: &str) -> Option<ColorSpace> {
    let lower = stem.to_lowercase();
    ColorSpace::ALL
        .into_iter()
        .find(|cs| lower.contains(&cs.suffix()))
}

pub fn has_color_space_token(stem: &str) -> bool {
    find_color_space_token(stem).is_some()
}

pub fn ends_with_color_space_suffix(stem: &str) -> bool {
    trailing_suffix_pattern().is_match(stem)
}

pub fn strip_color_space_suffix(stem: &str) -> String {
    trailing_suffix_pattern().replace(stem, "").into_owned()
}

/// Displacement maps keep full float precision and skip lossy compression.
pub fn is_displacement(stem: &str) -> bool {
    displacement_pattern().is_match(stem)
}

/// Data maps (normals, roughness, masks, ...) by naming convention.
pub fn looks_like_data_map(stem: &str) -> bool {
    raw_data_pattern().is_match(&stem.to_lowercase())
}

/// Space for a file whose name carries no explicit token.
fn infer_color_space(stem: &str, extension: &str, tif_srgb: bool) -> ColorSpace {
    if looks_like_data_map(stem) {
        return ColorSpace::Raw;
    }
    match extension {
        "exr" => ColorSpace::LinSrgb,
        "tif" | "tiff" if tif_srgb => ColorSpace::SrgbTexture,
        "tif" | "tiff" => ColorSpace::LinSrgb,
        _ => ColorSpace::SrgbTexture,
    }
}

/// Path with `_<space>` inserted before the extension.
pub fn with_color_space_suffix(path: &Path, color_space: ColorSpace) -> PathBuf {
    let stem = file_stem_string(path);
    let file_name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, color_space.suffix(), ext.to_string_lossy()),
        None => format!("{}{}", stem, color_space.suffix()),
    };
    path.with_file_name(file_name)
}

/// Label one texture.
///
/// An explicit token in the name wins; then the data-map vocabulary; then
/// the extension (EXR is linear, TIFF follows `tif_srgb`, everything else is
/// treated as an sRGB texture).
pub fn determine_color_space(path: &Path, tif_srgb: bool) -> ColorSpaceGuess {
    let stem = file_stem_string(path);
    let extension = get_extension_lowercase(path);

    let (color_space, suggested_path) = match find_color_space_token(&stem) {
        Some(cs) => (cs, path.to_path_buf()),
        None => {
            let cs = infer_color_space(&stem, &extension, tif_srgb);
            (cs, with_color_space_suffix(path, cs))
        }
    };

    ColorSpaceGuess {
        color_space,
        additional_options: color_space.additional_options(),
        suggested_path,
    }
}
