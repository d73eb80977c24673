use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cancel::{CancellationToken, CancelledError};
use crate::date::exif::EmbeddedExifReader;
use crate::date::exiftool::ExifToolReader;
use crate::date::ffprobe::FfProbeReader;
use crate::date::mtime::ModifiedTime;
use crate::date::{DateProvider, DateResult, DateSource};
use crate::media::MediaFile;
use crate::rename::{canonical_stem, is_canonical_name, next_free_path, safe_rename};
use crate::tool::Toolbox;
use crate::ProcessOptions;

/// Why a file was left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "message")]
pub enum FailReason {
    /// Every source declined, the fallback included.
    NoDatetime,
    /// The rename itself failed; the OS error message.
    Rename(String),
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::NoDatetime => f.write_str("no-datetime"),
            FailReason::Rename(message) => f.write_str(message),
        }
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum Outcome {
    /// Already canonically named.
    Skipped,
    Renamed(PathBuf),
    /// Dry run: where the file would go.
    DryRun(PathBuf),
    Failed(FailReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped => f.write_str("skip (already named)"),
            Outcome::Renamed(dest) => write!(f, "renamed -> {}", file_name(dest)),
            Outcome::DryRun(dest) => write!(f, "DRY-RUN -> {}", file_name(dest)),
            Outcome::Failed(reason) => reason.fmt(f),
        }
    }
}

/// What happened to one input file. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    /// The path as it was before processing.
    pub path: PathBuf,
    pub success: bool,
    pub message: String,
    pub outcome: Outcome,
    /// Source of the timestamp, when one was resolved.
    pub source: Option<DateSource>,
}

impl RenameOutcome {
    pub fn new(path: impl Into<PathBuf>, outcome: Outcome, source: Option<DateSource>) -> Self {
        Self {
            path: path.into(),
            success: outcome.is_success(),
            message: outcome.to_string(),
            outcome,
            source,
        }
    }
}

/// Ordered metadata sources; the first to answer wins.
pub struct Pipeline {
    providers: Vec<Box<dyn DateProvider>>,
}

impl Pipeline {
    /// The standard order: exiftool (if found), embedded EXIF, ffprobe (if
    /// found), then modification time when `fallback_mtime` is set.
    pub fn new(toolbox: Toolbox, fallback_mtime: bool) -> Self {
        let mut providers: Vec<Box<dyn DateProvider>> = Vec::with_capacity(4);
        if let Some(tool) = toolbox.exiftool {
            providers.push(Box::new(ExifToolReader::new(tool)));
        }
        providers.push(Box::new(EmbeddedExifReader));
        if let Some(tool) = toolbox.ffprobe {
            providers.push(Box::new(FfProbeReader::new(tool)));
        }
        if fallback_mtime {
            providers.push(Box::new(ModifiedTime));
        }
        Self { providers }
    }

    /// Probe the tools named by `options` and build the standard order.
    pub fn discover(options: &ProcessOptions) -> Self {
        Self::new(Toolbox::discover(&options.tools), options.fallback_mtime)
    }

    /// A custom order, e.g. for tests.
    pub fn from_providers(providers: Vec<Box<dyn DateProvider>>) -> Self {
        Self { providers }
    }

    pub fn sources(&self) -> Vec<DateSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// Try each applicable source in order until one produces a timestamp.
    pub fn resolve(
        &self,
        file: &MediaFile,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<DateResult>, CancelledError> {
        for provider in &self.providers {
            if let Some(token) = cancel {
                token.check()?;
            }
            if !provider.supports(file.kind) {
                continue;
            }
            if let Some(date) = provider.extract(file, cancel)? {
                let source = provider.source();
                tracing::debug!(path = %file.path.display(), %source, %date, "resolved");
                return Ok(Some(DateResult { date, source }));
            }
            tracing::trace!(path = %file.path.display(), source = %provider.source(), "declined");
        }
        Ok(None)
    }

    /// Resolve and rename one file (or only report the target when `dry_run`).
    ///
    /// Only cancellation is an error; every per-file failure is an outcome.
    pub fn process(
        &self,
        file: &MediaFile,
        dry_run: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<RenameOutcome, CancelledError> {
        let path = file.path.as_path();
        if is_canonical_name(&file_name(path)) {
            return Ok(RenameOutcome::new(path, Outcome::Skipped, None));
        }

        let Some(resolved) = self.resolve(file, cancel)? else {
            tracing::debug!(path = %path.display(), "no source produced a timestamp");
            return Ok(RenameOutcome::new(
                path,
                Outcome::Failed(FailReason::NoDatetime),
                None,
            ));
        };
        if let Some(token) = cancel {
            token.check()?;
        }

        let stem = canonical_stem(&resolved.date);
        let source = Some(resolved.source);

        if dry_run {
            let target = next_free_path(path, &stem);
            let outcome = if target == path {
                Outcome::Skipped
            } else {
                Outcome::DryRun(target)
            };
            return Ok(RenameOutcome::new(path, outcome, source));
        }

        let outcome = match safe_rename(path, &stem) {
            Ok(dest) if dest == path => Outcome::Skipped,
            Ok(dest) => {
                tracing::info!(from = %path.display(), to = %dest.display(), "renamed");
                Outcome::Renamed(dest)
            }
            Err(err) => {
                tracing::warn!(from = %err.from.display(), to = %err.to.display(), %err, "rename failed");
                Outcome::Failed(FailReason::Rename(err.to_string()))
            }
        };
        Ok(RenameOutcome::new(path, outcome, source))
    }
}

/// Process a single file the way the batch does: tools are probed for this
/// call only.
pub fn process_file(
    path: &Path,
    options: &ProcessOptions,
    cancel: Option<&CancellationToken>,
) -> Result<RenameOutcome, CancelledError> {
    Pipeline::discover(options).process(&MediaFile::new(path), options.dry_run, cancel)
}
