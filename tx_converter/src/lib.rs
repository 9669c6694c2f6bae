//! TX Converter
//!
//! Batch conversion of source images (PNG, JPEG, TIFF, EXR, BMP, GIF) into
//! renderer textures by driving the vendor tools:
//! - Arnold `.tx` through `maketx`
//! - RenderMan `.tex` through `txmake`
//! - Houdini `.rat` through `imaketx`
//!
//! Color spaces are guessed from file names, bit depth and compression from
//! the extension and map type, and the jobs run on a bounded worker pool.

pub mod adapter;
pub mod color_space;
pub mod dispatcher;
pub mod error;
pub mod formats;
pub mod intake;
pub mod job;
pub mod naming;
pub mod rename;
pub mod settings;
pub mod tools;

pub use adapter::{build_invocation, execute, ToolInvocation};
pub use color_space::{determine_color_space, ColorSpace, ColorSpaceGuess};
pub use dispatcher::{BatchReport, Dispatcher};
pub use error::{Result, TxError};
pub use formats::{resolve_bit_depth, BitDepth, Compression, TargetFormat};
pub use intake::{collect_dropped, gather_textures, group_textures, render_groups, TextureGroups};
pub use job::{plan_jobs, JobOutcome, JobStatus, Plan, TextureJob};
pub use naming::{output_path, output_stem, NamingMode};
pub use rename::{add_missing_suffixes, label_sources, rename_folder, RenameReport};
pub use settings::ConversionSettings;
pub use tools::{ToolEnvironment, ToolOverrides, ToolStatus};
