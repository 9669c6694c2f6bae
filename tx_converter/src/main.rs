use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{
    create_spinner, print_simple_summary, print_summary_report, set_quiet_mode, CancelToken,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tx_converter::intake::groups_to_json;
use tx_converter::settings::DEFAULT_WORKERS;
use tx_converter::{
    add_missing_suffixes, collect_dropped, gather_textures, group_textures, label_sources,
    plan_jobs, rename_folder, render_groups, ConversionSettings, Dispatcher, RenameReport, TargetFormat,
    ToolEnvironment, ToolOverrides,
};

#[derive(Parser)]
#[command(name = "tx-converter")]
#[command(version, about = "Batch texture converter for Arnold (.tx), RenderMan (.tex) and Houdini (.rat)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mirror debug logging to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Hide progress bars.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview the textures of a folder grouped by color space and extension.
    Scan {
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        #[arg(long)]
        no_recursive: bool,

        /// Treat untagged TIFFs as linear instead of sRGB.
        #[arg(long)]
        tif_linear: bool,

        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,
    },

    /// Convert textures. Files given as arguments take precedence over --folder.
    Convert {
        #[arg(value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        #[arg(long, value_name = "DIR")]
        folder: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = TargetFormat::Tx)]
        target: TargetFormat,

        /// Disable DWAA compression.
        #[arg(long)]
        no_compression: bool,

        /// Append the detected color space to output names.
        #[arg(long)]
        add_suffix: bool,

        /// Name outputs `<stem>_acescg`.
        #[arg(long)]
        acescg: bool,

        /// Write color maps as 32-bit float.
        #[arg(long)]
        hdri: bool,

        #[arg(long)]
        tif_linear: bool,

        #[arg(long)]
        no_recursive: bool,

        /// Parallel converters (0 = from core count).
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        jobs: usize,

        /// Reconvert outputs that are already up to date.
        #[arg(short, long)]
        force: bool,

        /// Print the converter commands without running them.
        #[arg(long)]
        dry_run: bool,

        /// Write outputs here, mirroring the folder structure.
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Rename unlabeled textures on disk to carry their color-space suffix.
    Rename {
        #[arg(value_name = "FOLDER_OR_FILES", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        no_recursive: bool,

        #[arg(long)]
        tif_linear: bool,
    },

    /// Show where each converter and the OCIO config resolve to.
    Tools {
        #[command(flatten)]
        tools: ToolArgs,

        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,
    },
}

#[derive(Args, Clone, Default)]
struct ToolArgs {
    /// maketx binary (default: $MAKETX_PATH or maketx on PATH)
    #[arg(long, value_name = "PATH")]
    maketx: Option<PathBuf>,

    /// RenderMan install (default: $RMANTREE)
    #[arg(long, value_name = "DIR")]
    rmantree: Option<PathBuf>,

    /// OpenColorIO config (default: $OCIO, then $RV_OCIO)
    #[arg(long, value_name = "FILE")]
    ocio: Option<PathBuf>,

    /// imaketx binary (default: $IMAKETEX)
    #[arg(long, value_name = "PATH")]
    imaketx: Option<PathBuf>,

    /// Houdini install (default: $HFS)
    #[arg(long, value_name = "DIR")]
    hfs: Option<PathBuf>,
}

impl From<ToolArgs> for ToolOverrides {
    fn from(args: ToolArgs) -> Self {
        ToolOverrides {
            maketx: args.maketx,
            rmantree: args.rmantree,
            ocio: args.ocio,
            imaketx: args.imaketx,
            hfs: args.hfs,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging("tx_converter", LogConfig::default().verbose(cli.verbose)) {
        eprintln!("⚠️  Logging disabled: {:#}", e);
    }
    set_quiet_mode(cli.quiet);

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", style("❌ Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the command ran but something failed.
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Scan {
            folder,
            no_recursive,
            tif_linear,
            output,
        } => {
            let files = gather_textures(&folder, !no_recursive)?;
            let groups = group_textures(&files, !tif_linear);
            match output {
                OutputFormat::Human => println!("{}", render_groups(&groups)),
                OutputFormat::Json => println!("{}", groups_to_json(&groups)?),
            }
            Ok(true)
        }

        Commands::Convert {
            inputs,
            folder,
            target,
            no_compression,
            add_suffix,
            acescg,
            hdri,
            tif_linear,
            no_recursive,
            jobs,
            force,
            dry_run,
            output,
            tools,
        } => {
            let settings = ConversionSettings {
                target,
                compression: !no_compression,
                add_suffix,
                rename_to_acescg: acescg,
                hdri,
                tif_srgb: !tif_linear,
                recursive: !no_recursive,
                jobs,
                force,
                dry_run,
                output_dir: output,
            };
            convert(&inputs, folder.as_deref(), settings, tools.into())
        }

        Commands::Rename {
            inputs,
            no_recursive,
            tif_linear,
        } => {
            let report = if inputs.len() == 1 && inputs[0].is_dir() {
                rename_folder(&inputs[0], !no_recursive, !tif_linear)?
            } else {
                let files = collect_dropped(&inputs, !no_recursive);
                if files.is_empty() {
                    bail!("None of the given paths exist");
                }
                add_missing_suffixes(&files, !tif_linear)
            };
            print_rename_report(&report);
            Ok(!report.has_errors())
        }

        Commands::Tools { tools, output } => {
            let env = ToolEnvironment::from_env().with_overrides(tools.into());
            let status = env.status();
            match output {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "tools": status,
                        "ocio": env.ocio_config(),
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Human => {
                    for s in &status {
                        match (&s.path, &s.error) {
                            (Some(path), _) => println!(
                                "{} {:<8} (.{}) {}",
                                style("✅").green(),
                                s.tool,
                                s.target,
                                path.display()
                            ),
                            (None, Some(err)) => println!(
                                "{} {:<8} (.{}) {}",
                                style("❌").red(),
                                s.tool,
                                s.target,
                                err
                            ),
                            (None, None) => {}
                        }
                    }
                    match env.ocio_config() {
                        Some(cfg) => println!("🎨 OCIO config: {}", cfg.display()),
                        None => println!("🎨 OCIO config: not set (no color conversion)"),
                    }
                }
            }
            Ok(status.iter().any(|s| s.is_available()))
        }
    }
}

fn convert(
    inputs: &[PathBuf],
    folder: Option<&Path>,
    settings: ConversionSettings,
    overrides: ToolOverrides,
) -> Result<bool> {
    let (files, base_dir) = if !inputs.is_empty() {
        let files = collect_dropped(inputs, settings.recursive);
        if files.is_empty() {
            bail!("None of the given files exist");
        }
        (files, None)
    } else if let Some(folder) = folder {
        let spinner = create_spinner(&format!("Scanning {}", folder.display()));
        let scanned = gather_textures(folder, settings.recursive);
        spinner.finish_and_clear();
        let files = scanned.with_context(|| format!("Cannot scan {}", folder.display()))?;
        (files, Some(folder.to_path_buf()))
    } else {
        bail!("Give texture files or --folder <DIR>");
    };

    if files.is_empty() {
        println!("📂 No textures found");
        return Ok(true);
    }

    let env = ToolEnvironment::from_env().with_overrides(overrides);
    let program = match env.resolve(settings.target) {
        Ok(program) => program,
        Err(e) if settings.dry_run => {
            warn!(error = %e, "Converter not found, showing commands with the bare tool name");
            PathBuf::from(settings.target.tool_name())
        }
        Err(e) => return Err(e.into()),
    };
    if env.ocio_config().is_none() && settings.target == TargetFormat::Tx {
        warn!("No OCIO config set (OCIO / RV_OCIO); textures are converted without color transforms");
    }

    let labeled = label_sources(&files, base_dir.as_deref(), &settings)?;
    if !labeled.renamed.is_empty() || labeled.has_errors() {
        print_rename_report(&labeled);
    }

    let plan = plan_jobs(&labeled.updated, &settings, base_dir.as_deref());
    println!(
        "📂 Found {} textures, {} to convert → .{} ({} workers)",
        plan.total(),
        plan.jobs.len(),
        settings.target,
        shared_utils::thread_manager::resolve_worker_count(settings.jobs)
    );
    for skipped in &plan.skipped {
        info!(path = %skipped.path.display(), reason = %skipped.reason, "Skipping texture");
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\n⚠️  Cancelling, stopping running converters...");
        handler_token.cancel();
    }) {
        warn!(error = %e, "Could not install Ctrl-C handler");
    }

    let report = Dispatcher::new(program, env.ocio.clone())
        .with_workers(settings.jobs)
        .with_cancel_token(cancel)
        .dry_run(settings.dry_run)
        .run(plan)?;

    if settings.dry_run {
        for command in &report.commands {
            println!("{}", command);
        }
        print_simple_summary(&report.result);
    } else {
        print_summary_report(
            &report.result,
            report.duration,
            report.input_bytes,
            report.output_bytes,
            "Texture Conversion",
        );
    }

    Ok(!report.result.has_failures() && !labeled.has_errors())
}

fn print_rename_report(report: &RenameReport) {
    for (from, to) in &report.renamed {
        println!(
            "✏️  {} → {}",
            from.display(),
            to.file_name().unwrap_or_default().to_string_lossy()
        );
    }
    for (path, error) in &report.errors {
        println!("{} {}: {}", style("❌").red(), path.display(), error);
    }

    println!(
        "\n✅ Complete: {} renamed, {} already labeled or skipped, {} failed",
        report.renamed.len(),
        report.skipped.len(),
        report.errors.len()
    );
}
