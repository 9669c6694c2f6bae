//! External Tool Adapter
//!
//! Builds the argument list for maketx / txmake / imaketx from a
//! [`TextureJob`], runs the tool as a child process (never through a
//! shell) and turns the exit status into a [`JobOutcome`].

use crate::color_space::ColorSpace;
use crate::error::{Result, TxError};
use crate::formats::TargetFormat;
use crate::job::{JobOutcome, TextureJob};
use shared_utils::common_utils::{ensure_dir_exists, format_command_string, tail_lines};
use shared_utils::logging::{combine_output, log_external_tool};
use shared_utils::{run_command, CancelToken, ProcessOutput};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Working space every color map is converted into.
pub const ACESCG_COLOR_SPACE: &str = "ACES - ACEScg";

/// Lines of stderr kept in a failure message.
const ERROR_TAIL_LINES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn command_line(&self) -> String {
        format_command_string(&self.program.to_string_lossy(), &self.args)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

fn maketx_args(job: &TextureJob, ocio: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-v".into(),
        "-o".into(),
        job.output.clone().into(),
        "-u".into(),
        "--format".into(),
        "exr".into(),
        "-d".into(),
        job.bit_depth.as_str().into(),
    ];
    if let Some(method) = job.compression.as_flag_value() {
        args.push("--compression".into());
        args.push(method.into());
    }
    args.push("--oiio".into());
    args.push(job.source.clone().into());

    if let Some(config) = ocio {
        args.push("--colorconfig".into());
        args.push(config.into());
        match job.color_space {
            ColorSpace::LinSrgb | ColorSpace::SrgbTexture => {
                args.push("--colorconvert".into());
                args.push(job.color_space.as_str().into());
                args.push(ACESCG_COLOR_SPACE.into());
            }
            ColorSpace::Raw => {}
        }
    }
    args
}

fn txmake_args(job: &TextureJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if job.bit_depth.is_floating_point() {
        args.push("-mode".into());
        args.push("luminance".into());
    }
    args.push(job.source.clone().into());
    args.push(job.output.clone().into());
    args
}

fn imaketx_args(job: &TextureJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-d".into(), job.bit_depth.as_str().into()];
    if let Some(method) = job.compression.as_flag_value() {
        args.push("--compression".into());
        args.push(method.into());
    }
    args.push(job.source.clone().into());
    args.push(job.output.clone().into());
    args
}

/// Command for `job` using the already resolved `program`.
pub fn build_invocation(job: &TextureJob, program: &Path, ocio: Option<&Path>) -> ToolInvocation {
    let args = match job.target {
        TargetFormat::Tx => maketx_args(job, ocio),
        TargetFormat::Tex => txmake_args(job),
        TargetFormat::Rat => imaketx_args(job),
    };
    ToolInvocation {
        tool: job.target.tool_name(),
        program: program.to_path_buf(),
        args,
    }
}

/// Run the tool and log the call.
pub fn run_invocation(invocation: &ToolInvocation, cancel: &CancelToken) -> Result<ProcessOutput> {
    let output = run_command(&mut invocation.to_command(), cancel).map_err(|e| TxError::Spawn {
        tool: invocation.tool.to_string(),
        message: format!("{:#}", e),
    })?;

    log_external_tool(
        invocation.tool,
        &invocation.command_line(),
        &combine_output(&output.stdout, &output.stderr),
        output.exit_code,
        output.duration,
    );
    Ok(output)
}

fn failure_message(tool: &str, output: &ProcessOutput) -> String {
    let detail = tail_lines(&output.stderr, ERROR_TAIL_LINES);
    let status = match output.exit_code {
        Some(code) => format!("{} exited with code {}", tool, code),
        None => format!("{} was terminated by a signal", tool),
    };
    if detail.is_empty() {
        status
    } else {
        format!("{}: {}", status, detail)
    }
}

/// Convert one texture. Exit code 0 is the only success.
pub fn execute(job: TextureJob, program: &Path, ocio: Option<&Path>, cancel: &CancelToken) -> JobOutcome {
    if let Some(parent) = job.output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = ensure_dir_exists(parent) {
                return JobOutcome::failed(job, format!("{:#}", e), None);
            }
        }
    }

    let invocation = build_invocation(&job, program, ocio);
    info!(
        source = %job.source.display(),
        color_space = %job.color_space,
        "Converting to .{}",
        job.target.extension()
    );

    let output = match run_invocation(&invocation, cancel) {
        Ok(output) => output,
        Err(e) => return JobOutcome::failed(job, e.to_string(), None),
    };

    if output.cancelled {
        if job.output.exists() {
            if let Err(e) = fs::remove_file(&job.output) {
                warn!(path = %job.output.display(), error = %e, "Failed to remove partial output");
            }
        }
        return JobOutcome::failed(job, "interrupted", Some(output));
    }

    if output.success() {
        info!(
            source = %job.source.display(),
            output = %job.output.display(),
            "Converted"
        );
        JobOutcome::converted(job, output)
    } else {
        let message = failure_message(invocation.tool, &output);
        JobOutcome::failed(job, message, Some(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{BitDepth, Compression};

    fn job(target: TargetFormat, color_space: ColorSpace, bit_depth: BitDepth, compression: Compression) -> TextureJob {
        TextureJob {
            source: PathBuf::from("/tex/in.png"),
            output: PathBuf::from(format!("/tex/in.{}", target.extension())),
            target,
            color_space,
            bit_depth,
            compression,
            displacement: false,
        }
    }

    fn args_of(inv: &ToolInvocation) -> Vec<String> {
        inv.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_maketx_without_ocio() {
        let j = job(TargetFormat::Tx, ColorSpace::SrgbTexture, BitDepth::Half, Compression::Dwaa);
        let inv = build_invocation(&j, Path::new("maketx"), None);
        assert_eq!(
            args_of(&inv),
            vec![
                "-v", "-o", "/tex/in.tx", "-u", "--format", "exr", "-d", "half",
                "--compression", "dwaa", "--oiio", "/tex/in.png",
            ]
        );
    }

    #[test]
    fn test_maketx_color_conversion() {
        let ocio = Path::new("/cfg/aces.ocio");
        let j = job(TargetFormat::Tx, ColorSpace::LinSrgb, BitDepth::Float, Compression::None);
        let args = args_of(&build_invocation(&j, Path::new("maketx"), Some(ocio)));
        assert_eq!(
            &args[args.len() - 5..],
            &["--colorconfig", "/cfg/aces.ocio", "--colorconvert", "lin_srgb", "ACES - ACEScg"]
        );
        assert!(!args.contains(&"--compression".to_string()));
    }

    #[test]
    fn test_maketx_raw_gets_config_only() {
        let ocio = Path::new("/cfg/aces.ocio");
        let j = job(TargetFormat::Tx, ColorSpace::Raw, BitDepth::Half, Compression::Dwaa);
        let args = args_of(&build_invocation(&j, Path::new("maketx"), Some(ocio)));
        assert_eq!(&args[args.len() - 2..], &["--colorconfig", "/cfg/aces.ocio"]);
        assert!(!args.contains(&"--colorconvert".to_string()));
    }

    #[test]
    fn test_txmake_luminance_mode() {
        let half = job(TargetFormat::Tex, ColorSpace::Raw, BitDepth::Half, Compression::None);
        assert_eq!(
            args_of(&build_invocation(&half, Path::new("txmake"), None)),
            vec!["-mode", "luminance", "/tex/in.png", "/tex/in.tex"]
        );
        let byte = job(TargetFormat::Tex, ColorSpace::SrgbTexture, BitDepth::Uint8, Compression::Dwaa);
        assert_eq!(
            args_of(&build_invocation(&byte, Path::new("txmake"), None)),
            vec!["/tex/in.png", "/tex/in.tex"]
        );
    }

    #[test]
    fn test_imaketx_args() {
        let j = job(TargetFormat::Rat, ColorSpace::SrgbTexture, BitDepth::Uint8, Compression::Dwaa);
        let inv = build_invocation(&j, Path::new("/opt/hfs/bin/imaketx"), None);
        assert_eq!(inv.tool, "imaketx");
        assert_eq!(
            args_of(&inv),
            vec!["-d", "uint8", "--compression", "dwaa", "/tex/in.png", "/tex/in.rat"]
        );
    }

    #[test]
    fn test_command_line_quotes_color_space_name() {
        let j = job(TargetFormat::Tx, ColorSpace::SrgbTexture, BitDepth::Uint8, Compression::None);
        let inv = build_invocation(&j, Path::new("maketx"), Some(Path::new("/cfg/c.ocio")));
        assert!(inv.command_line().ends_with("\"ACES - ACEScg\""));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            {
                let mut f = fs::File::create(&path).unwrap();
                writeln!(f, "#!/bin/sh").unwrap();
                f.write_all(body.as_bytes()).unwrap();
                f.sync_all().unwrap();
            }
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn tx_job(dir: &Path) -> TextureJob {
            let source = dir.join("wood.png");
            fs::write(&source, b"png").unwrap();
            TextureJob {
                source,
                output: dir.join("out").join("wood.tx"),
                target: TargetFormat::Tx,
                color_space: ColorSpace::SrgbTexture,
                bit_depth: BitDepth::Half,
                compression: Compression::Dwaa,
                displacement: false,
            }
        }

        #[test]
        fn test_exit_zero_is_converted() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(
                dir.path(),
                "maketx",
                "while [ $# -gt 0 ]; do if [ \"$1\" = \"-o\" ]; then touch \"$2\"; fi; shift; done\n",
            );
            let job = tx_job(dir.path());
            let output = job.output.clone();

            let outcome = execute(job, &tool, None, &CancelToken::new());
            assert_eq!(outcome.status, crate::job::JobStatus::Converted);
            assert!(output.exists());
        }

        #[test]
        fn test_non_zero_exit_is_failed_with_stderr() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(dir.path(), "maketx", "echo 'bad header' >&2\nexit 2\n");

            let outcome = execute(tx_job(dir.path()), &tool, None, &CancelToken::new());
            match outcome.status {
                crate::job::JobStatus::Failed(msg) => {
                    assert!(msg.contains("exited with code 2"), "{}", msg);
                    assert!(msg.contains("bad header"), "{}", msg);
                }
                other => panic!("expected failure, got {:?}", other),
            }
            assert_eq!(outcome.process.and_then(|p| p.exit_code), Some(2));
        }

        #[test]
        fn test_missing_program_is_failed() {
            let dir = TempDir::new().unwrap();
            let outcome = execute(
                tx_job(dir.path()),
                &dir.path().join("no-such-maketx"),
                None,
                &CancelToken::new(),
            );
            assert!(outcome.is_failure());
            assert!(outcome.process.is_none());
        }

        #[test]
        fn test_cancelled_run_is_interrupted() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(dir.path(), "maketx", "exec sleep 30\n");
            let cancel = CancelToken::new();
            cancel.cancel();

            let outcome = execute(tx_job(dir.path()), &tool, None, &cancel);
            assert_eq!(outcome.status, crate::job::JobStatus::Failed("interrupted".to_string()));
        }
    }
}
