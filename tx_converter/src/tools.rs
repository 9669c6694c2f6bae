//! Tool environment
//!
//! Locates the vendor converters and the OpenColorIO config from the
//! environment (`MAKETX_PATH`, `RMANTREE`, `OCIO`/`RV_OCIO`, `IMAKETEX`,
//! `HFS`), with command-line overrides taking precedence.

use crate::error::{Result, TxError};
use crate::formats::TargetFormat;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Explicit locations given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    pub maketx: Option<PathBuf>,
    pub rmantree: Option<PathBuf>,
    pub ocio: Option<PathBuf>,
    pub imaketx: Option<PathBuf>,
    pub hfs: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    /// maketx binary; bare names are looked up on `PATH`.
    pub maketx: Option<PathBuf>,
    pub rmantree: Option<PathBuf>,
    pub ocio: Option<PathBuf>,
    pub imaketx: Option<PathBuf>,
    pub hfs: Option<PathBuf>,
}

fn non_empty(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Platform executable name.
pub fn exe_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Explicit path (anything with a directory part) must exist; a bare name is
/// searched on `PATH`.
fn resolve_program(program: &Path, tool: &str, hint: &str) -> Result<PathBuf> {
    let is_bare = program.components().count() == 1 && !program.is_absolute();
    if is_bare {
        return which::which(program).map_err(|_| TxError::ToolNotFound {
            tool: tool.to_string(),
            hint: hint.to_string(),
        });
    }
    if program.is_file() {
        Ok(program.to_path_buf())
    } else {
        Err(TxError::ToolNotFound {
            tool: tool.to_string(),
            hint: format!("{} does not exist", program.display()),
        })
    }
}

impl ToolEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            maketx: non_empty(lookup("MAKETX_PATH")),
            rmantree: non_empty(lookup("RMANTREE")),
            ocio: non_empty(lookup("OCIO")).or_else(|| non_empty(lookup("RV_OCIO"))),
            imaketx: non_empty(lookup("IMAKETEX")),
            hfs: non_empty(lookup("HFS")),
        }
    }

    pub fn with_overrides(mut self, overrides: ToolOverrides) -> Self {
        if overrides.maketx.is_some() {
            self.maketx = overrides.maketx;
        }
        if overrides.rmantree.is_some() {
            self.rmantree = overrides.rmantree;
        }
        if overrides.ocio.is_some() {
            self.ocio = overrides.ocio;
        }
        if overrides.imaketx.is_some() {
            self.imaketx = overrides.imaketx;
        }
        if overrides.hfs.is_some() {
            self.hfs = overrides.hfs;
        }
        self
    }

    pub fn ocio_config(&self) -> Option<&Path> {
        self.ocio.as_deref()
    }

    /// Binary path for the converter of `target`.
    pub fn resolve(&self, target: TargetFormat) -> Result<PathBuf> {
        let resolved = match target {
            TargetFormat::Tx => {
                let program = self
                    .maketx
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(exe_name("maketx")));
                resolve_program(&program, "maketx", "install OpenImageIO or set MAKETX_PATH")
            }
            TargetFormat::Tex => match &self.rmantree {
                Some(root) => {
                    let txmake = root.join("bin").join(exe_name("txmake"));
                    resolve_program(&txmake, "txmake", "check RMANTREE")
                }
                None => Err(TxError::ToolNotFound {
                    tool: "txmake".to_string(),
                    hint: "set RMANTREE to the RenderMan install".to_string(),
                }),
            },
            TargetFormat::Rat => {
                if let Some(explicit) = &self.imaketx {
                    resolve_program(explicit, "imaketx", "check IMAKETEX or put it on PATH")
                } else {
                    let from_hfs = self
                        .hfs
                        .as_ref()
                        .map(|hfs| hfs.join("bin").join(exe_name("imaketx")))
                        .filter(|p| p.is_file());
                    match from_hfs {
                        Some(path) => Ok(path),
                        None => resolve_program(
                            Path::new(&exe_name("imaketx")),
                            "imaketx",
                            "set HFS to the Houdini install or IMAKETEX to the binary",
                        ),
                    }
                }
            }
        }?;

        debug!(tool = target.tool_name(), path = %resolved.display(), "Resolved texture tool");
        Ok(resolved)
    }

    pub fn status(&self) -> Vec<ToolStatus> {
        [TargetFormat::Tx, TargetFormat::Tex, TargetFormat::Rat]
            .into_iter()
            .map(|target| match self.resolve(target) {
                Ok(path) => ToolStatus {
                    target,
                    tool: target.tool_name(),
                    path: Some(path),
                    error: None,
                },
                Err(e) => ToolStatus {
                    target,
                    tool: target.tool_name(),
                    path: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }
}

/// One line of the `tools` report.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub target: TargetFormat,
    pub tool: &'static str,
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}
