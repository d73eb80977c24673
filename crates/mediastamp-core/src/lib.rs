pub mod cancel;
pub mod date;
pub mod media;
pub mod pipeline;
pub mod rename;
pub mod scan;
pub mod tool;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use cancel::{CancellationToken, CancelledError};
pub use date::{DateProvider, DateResult, DateSource};
pub use media::{MediaFile, MediaKind};
pub use pipeline::{process_file, FailReason, Outcome, Pipeline, RenameOutcome};
pub use tool::{ToolOptions, Toolbox};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub folder: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    /// Report target names without renaming anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Use the file modification time when no metadata source answers.
    #[serde(default = "default_true")]
    pub fallback_mtime: bool,
    #[serde(default)]
    pub tools: ToolOptions,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            recursive: false,
            dry_run: false,
            fallback_mtime: true,
            tools: ToolOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// One entry per file handled, in processing order.
    pub outcomes: Vec<RenameOutcome>,
    pub ok: u64,
    pub errors: u64,
    /// The run stopped early; files before the stop keep their new names.
    pub cancelled: bool,
}

impl ProcessResult {
    fn new(outcomes: Vec<RenameOutcome>, cancelled: bool) -> Self {
        let ok = outcomes.iter().filter(|o| o.success).count() as u64;
        let errors = outcomes.len() as u64 - ok;
        Self {
            outcomes,
            ok,
            errors,
            cancelled,
        }
    }
}

/// Control options for process execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    /// Cancellation token, checked before each file and during tool calls.
    pub cancel_token: Option<CancellationToken>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// Called after each file with the outcome, its index and the total count.
pub type ProgressCallback<'a> = dyn Fn(&RenameOutcome, u64, u64) + Send + Sync + 'a;

/// Rename every media file in `options.folder`.
pub fn process(
    options: &ProcessOptions,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ProcessResult> {
    process_with_control(options, &ProcessControl::default(), progress_callback)
}

/// Rename every media file in `options.folder`, honoring cancellation.
///
/// A cancelled run is not an error: the result carries the outcomes produced
/// so far with `cancelled` set.
pub fn process_with_control(
    options: &ProcessOptions,
    control: &ProcessControl,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ProcessResult> {
    let cancel = control.cancel_token.as_ref();
    let files = scan::discover_media(&options.folder, options.recursive)?;
    let pipeline = Pipeline::discover(options);
    tracing::debug!(
        files = files.len(),
        sources = ?pipeline.sources(),
        "starting run"
    );

    let total = files.len() as u64;
    let mut outcomes = Vec::with_capacity(files.len());
    let mut cancelled = false;

    for (i, file) in files.iter().enumerate() {
        let result = match cancel {
            Some(token) => token
                .check()
                .and_then(|()| pipeline.process(file, options.dry_run, Some(token))),
            None => pipeline.process(file, options.dry_run, None),
        };
        match result {
            Ok(outcome) => {
                progress_callback(&outcome, i as u64, total);
                outcomes.push(outcome);
            }
            Err(CancelledError) => {
                tracing::warn!(done = i, total, "cancelled");
                cancelled = true;
                break;
            }
        }
    }

    Ok(ProcessResult::new(outcomes, cancelled))
}
