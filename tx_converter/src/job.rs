//! Job records and batch planning.

use crate::color_space::{determine_color_space, is_displacement, ColorSpace};
use crate::formats::{
    is_converted_extension, is_source_extension, resolve_bit_depth, BitDepth, Compression,
    TargetFormat,
};
use crate::naming::{output_path, output_stem};
use crate::settings::ConversionSettings;
use serde::Serialize;
use shared_utils::common_utils::{file_stem_string, get_extension_lowercase};
use shared_utils::ProcessOutput;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything needed to convert one texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub target: TargetFormat,
    pub color_space: ColorSpace,
    pub bit_depth: BitDepth,
    pub compression: Compression,
    pub displacement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Converted,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: TextureJob,
    pub status: JobStatus,
    /// Absent for dry runs, cancelled jobs and launch failures.
    pub process: Option<ProcessOutput>,
}

impl JobOutcome {
    pub fn converted(job: TextureJob, process: ProcessOutput) -> Self {
        Self {
            job,
            status: JobStatus::Converted,
            process: Some(process),
        }
    }

    pub fn skipped(job: TextureJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: JobStatus::Skipped(reason.into()),
            process: None,
        }
    }

    pub fn failed(job: TextureJob, message: impl Into<String>, process: Option<ProcessOutput>) -> Self {
        Self {
            job,
            status: JobStatus::Failed(message.into()),
            process,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failed(_))
    }
}

/// A texture left out of the plan and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTexture {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub jobs: Vec<TextureJob>,
    pub skipped: Vec<SkippedTexture>,
}

impl Plan {
    pub fn total(&self) -> usize {
        self.jobs.len() + self.skipped.len()
    }
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(out)) => out >= src,
        _ => false,
    }
}

/// Build one job per convertible texture.
///
/// `base_dir` is the scanned folder, used to mirror the tree when an output
/// directory is set.
pub fn plan_jobs(paths: &[PathBuf], settings: &ConversionSettings, base_dir: Option<&Path>) -> Plan {
    let mut plan = Plan::default();
    let mut claimed_outputs: HashSet<PathBuf> = HashSet::new();
    let naming = settings.naming_mode();

    for path in paths {
        let skip = |reason: String| SkippedTexture {
            path: path.clone(),
            reason,
        };

        let ext = get_extension_lowercase(path);
        if is_converted_extension(&ext) {
            plan.skipped.push(skip("already processed".to_string()));
            continue;
        }
        if !is_source_extension(&ext) {
            plan.skipped.push(skip(format!("unsupported extension '{}'", ext)));
            continue;
        }

        let stem = file_stem_string(path);
        let color_space = determine_color_space(path, settings.tif_srgb).color_space;
        let displacement = is_displacement(&stem);

        let output = match output_path(
            path,
            &output_stem(&stem, color_space, naming),
            settings.target,
            settings.output_dir.as_deref(),
            base_dir,
        ) {
            Ok(output) => output,
            Err(e) => {
                plan.skipped.push(skip(e.to_string()));
                continue;
            }
        };

        if !claimed_outputs.insert(output.clone()) {
            plan.skipped
                .push(skip(format!("output {} already produced by another source", output.display())));
            continue;
        }

        if !settings.force && is_up_to_date(path, &output) {
            plan.skipped.push(skip("up to date".to_string()));
            continue;
        }

        let job = TextureJob {
            source: path.clone(),
            output,
            target: settings.target,
            color_space,
            bit_depth: resolve_bit_depth(&ext, color_space, displacement, settings.hdri),
            compression: Compression::resolve(settings.compression, displacement),
            displacement,
        };
        debug!(
            source = %job.source.display(),
            color_space = %job.color_space,
            bit_depth = %job.bit_depth,
            "Planned texture job"
        );
        plan.jobs.push(job);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        File::create(&p).unwrap();
        p
    }

    #[test]
    fn test_one_job_per_source() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            touch(dir.path(), "a.png"),
            touch(dir.path(), "b.jpg"),
            touch(dir.path(), "c.exr"),
        ];
        let plan = plan_jobs(&paths, &ConversionSettings::default(), None);
        assert_eq!(plan.jobs.len(), 3);
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.jobs[0].output, dir.path().join("a.tx"));
    }

    #[test]
    fn test_empty_input_is_empty_plan() {
        let plan = plan_jobs(&[], &ConversionSettings::default(), None);
        assert_eq!(plan.total(), 0);
    }

    #[test]
    fn test_skips_converted_and_unsupported() {
        let dir = TempDir::new().unwrap();
        let paths = vec![touch(dir.path(), "a.tx"), touch(dir.path(), "notes.txt")];
        let plan = plan_jobs(&paths, &ConversionSettings::default(), None);
        assert!(plan.jobs.is_empty());
        assert_eq!(plan.skipped[0].reason, "already processed");
        assert!(plan.skipped[1].reason.contains("unsupported"));
    }

    #[test]
    fn test_job_fields() {
        let dir = TempDir::new().unwrap();
        let paths = vec![touch(dir.path(), "cliff_disp.png"), touch(dir.path(), "cliff_albedo.jpg")];
        let settings = ConversionSettings {
            add_suffix: true,
            ..Default::default()
        };
        let plan = plan_jobs(&paths, &settings, None);

        let disp = &plan.jobs[0];
        assert!(disp.displacement);
        assert_eq!(disp.color_space, ColorSpace::Raw);
        assert_eq!(disp.bit_depth, BitDepth::Float);
        assert_eq!(disp.compression, Compression::None);
        assert_eq!(disp.output, dir.path().join("cliff_disp_raw.tx"));

        let albedo = &plan.jobs[1];
        assert_eq!(albedo.bit_depth, BitDepth::Uint8);
        assert_eq!(albedo.compression, Compression::Dwaa);
        assert_eq!(albedo.output, dir.path().join("cliff_albedo_srgb_texture.tx"));
    }

    #[test]
    fn test_up_to_date_outputs_are_skipped_unless_forced() {
        let dir = TempDir::new().unwrap();
        let src = touch(dir.path(), "wood.png");
        let out = touch(dir.path(), "wood.tx");
        set_file_mtime(&src, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        set_file_mtime(&out, FileTime::from_unix_time(2_000_000, 0)).unwrap();

        let plan = plan_jobs(&[src.clone()], &ConversionSettings::default(), None);
        assert!(plan.jobs.is_empty());
        assert_eq!(plan.skipped[0].reason, "up to date");

        let forced = ConversionSettings {
            force: true,
            ..Default::default()
        };
        assert_eq!(plan_jobs(&[src.clone()], &forced, None).jobs.len(), 1);

        // stale output is rebuilt
        set_file_mtime(&out, FileTime::from_unix_time(500_000, 0)).unwrap();
        assert_eq!(plan_jobs(&[src], &ConversionSettings::default(), None).jobs.len(), 1);
    }

    #[test]
    fn test_colliding_outputs() {
        let dir = TempDir::new().unwrap();
        let paths = vec![touch(dir.path(), "rock.png"), touch(dir.path(), "rock.jpg")];
        let plan = plan_jobs(&paths, &ConversionSettings::default(), None);
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.skipped[0].reason.contains("another source"));
    }

    #[test]
    fn test_output_dir_with_target() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("rock");
        std::fs::create_dir_all(&sub).unwrap();
        let src = touch(&sub, "rock_normal.tif");
        let out_dir = dir.path().join("out");
        let settings = ConversionSettings {
            target: TargetFormat::Tex,
            output_dir: Some(out_dir.clone()),
            ..Default::default()
        };
        let plan = plan_jobs(&[src], &settings, Some(dir.path()));
        assert_eq!(plan.jobs[0].output, out_dir.join("rock").join("rock_normal.tex"));
        assert_eq!(plan.jobs[0].color_space, ColorSpace::Raw);
    }
}
