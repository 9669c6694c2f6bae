//! Texture formats, source extensions and bit depth selection.

use crate::color_space::ColorSpace;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats accepted as conversion sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "exr", "bmp", "gif"];

/// Outputs of a previous run. Never fed back into a converter.
pub const CONVERTED_EXTENSIONS: &[&str] = &["tx", "tex", "rat"];

/// Renderer texture format to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Arnold `.tx` via maketx
    #[default]
    Tx,
    /// RenderMan `.tex` via txmake
    Tex,
    /// Houdini `.rat` via imaketx
    Rat,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Tx => "tx",
            TargetFormat::Tex => "tex",
            TargetFormat::Rat => "rat",
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            TargetFormat::Tx => "maketx",
            TargetFormat::Tex => "txmake",
            TargetFormat::Rat => "imaketx",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Channel data type written by the converter (`-d` for maketx).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    Uint8,
    Uint16,
    Half,
    Float,
}

impl BitDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            BitDepth::Uint8 => "uint8",
            BitDepth::Uint16 => "uint16",
            BitDepth::Half => "half",
            BitDepth::Float => "float",
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, BitDepth::Half | BitDepth::Float)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Dwaa,
}

impl Compression {
    /// DWAA is lossy, so displacement maps always stay uncompressed.
    pub fn resolve(enabled: bool, displacement: bool) -> Self {
        if enabled && !displacement {
            Compression::Dwaa
        } else {
            Compression::None
        }
    }

    pub fn as_flag_value(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Dwaa => Some("dwaa"),
        }
    }
}

pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext)
}

pub fn is_converted_extension(ext: &str) -> bool {
    CONVERTED_EXTENSIONS.contains(&ext)
}

/// Pick the output channel type.
///
/// `ext` must be lower-case. HDRI mode promotes color maps to float; data
/// maps keep their extension-based depth unless they are displacement.
pub fn resolve_bit_depth(ext: &str, color_space: ColorSpace, displacement: bool, hdri: bool) -> BitDepth {
    if displacement {
        return BitDepth::Float;
    }
    if hdri && color_space != ColorSpace::Raw {
        return BitDepth::Float;
    }
    match ext {
        "jpg" | "jpeg" | "gif" | "bmp" => BitDepth::Uint8,
        "png" | "tif" | "tiff" | "exr" => BitDepth::Half,
        _ => BitDepth::Uint16,
    }
}
