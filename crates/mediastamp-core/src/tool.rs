use std::env::consts::EXE_SUFFIX;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::cancel::{CancellationToken, CancelledError};

/// How often a running tool is checked for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_search_path() -> bool {
    true
}

/// Where to find external tools and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOptions {
    /// Directory searched before `PATH`. Defaults to `bin/` next to the
    /// running executable.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Fall back to the system `PATH` when the tool is not in `dir`.
    #[serde(default = "default_search_path")]
    pub search_path: bool,
    /// Upper bound for a single tool invocation; the child is killed after.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            dir: None,
            search_path: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ToolOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for {tool}: {source}")]
    Wait {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} did not finish within {timeout:?}")]
    TimedOut { tool: &'static str, timeout: Duration },
    #[error("{tool} exited with {status}")]
    Failed { tool: &'static str, status: ExitStatus },
    #[error("{tool} produced unreadable output")]
    Output { tool: &'static str },
    #[error(transparent)]
    Cancelled(#[from] CancelledError),
}

/// Directory checked before `PATH`: `bin/` next to the executable.
pub fn default_tool_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("bin"))
}

/// Find `name` in the tool directory first, then on `PATH`.
pub fn locate(name: &str, options: &ToolOptions) -> Option<PathBuf> {
    let dir = options.dir.clone().or_else(default_tool_dir);
    if let Some(dir) = dir {
        let mut candidates = Vec::with_capacity(2);
        if !EXE_SUFFIX.is_empty() && !name.ends_with(EXE_SUFFIX) {
            candidates.push(format!("{name}{EXE_SUFFIX}"));
        }
        candidates.push(name.to_string());

        for candidate in candidates {
            let local = dir.join(candidate);
            if local.is_file() {
                return Some(local);
            }
        }
    }
    if options.search_path {
        return which::which(name).ok();
    }
    None
}

/// A located external executable.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: &'static str,
    program: PathBuf,
    timeout: Duration,
}

impl ExternalTool {
    pub fn new(name: &'static str, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            name,
            program: program.into(),
            timeout,
        }
    }

    /// Locate `name` and check it answers `version_arg` with exit code 0.
    pub fn discover(name: &'static str, version_arg: &str, options: &ToolOptions) -> Option<Self> {
        let Some(program) = locate(name, options) else {
            tracing::debug!(tool = name, "not found");
            return None;
        };
        let tool = Self::new(name, program, options.timeout());
        match tool.run(&[version_arg], None) {
            Ok(_) => {
                tracing::debug!(tool = name, program = %tool.program().display(), "available");
                Some(tool)
            }
            Err(err) => {
                tracing::debug!(tool = name, %err, "version probe failed");
                None
            }
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the tool and return its stdout.
    ///
    /// Blocks until the process exits, the timeout elapses or `cancel` fires;
    /// in the last two cases the child is killed. A non-zero exit is an error.
    pub fn run<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        cancel: Option<&CancellationToken>,
    ) -> Result<String, ToolError> {
        let tool = self.name;
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ToolError::Spawn { tool, source })?;

        // Drain stdout on a separate thread so a large dump cannot fill the
        // pipe while we poll.
        let Some(mut stdout) = child.stdout.take() else {
            kill(&mut child);
            return Err(ToolError::Output { tool });
        };
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let started = Instant::now();
        let status = loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                kill(&mut child);
                return Err(CancelledError.into());
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill(&mut child);
                    return Err(ToolError::Wait { tool, source });
                }
            }
            if started.elapsed() >= self.timeout {
                kill(&mut child);
                tracing::warn!(tool, timeout = ?self.timeout, "tool timed out, killed");
                return Err(ToolError::TimedOut {
                    tool,
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        // Ctrl+C reaches the child too; report that as cancellation, not failure.
        if let Some(token) = cancel {
            token.check()?;
        }

        // A background grandchild can keep stdout open after the tool exits;
        // the deadline covers the drain as well.
        let bytes = match rx.recv_timeout(self.timeout.saturating_sub(started.elapsed())) {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(_)) | Err(RecvTimeoutError::Disconnected) => {
                return Err(ToolError::Output { tool })
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(tool, timeout = ?self.timeout, "tool output still open, gave up");
                return Err(ToolError::TimedOut {
                    tool,
                    timeout: self.timeout,
                });
            }
        };
        if !status.success() {
            return Err(ToolError::Failed { tool, status });
        }
        String::from_utf8(bytes).map_err(|_| ToolError::Output { tool })
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Turn a tool result into "output or decline", letting only cancellation
/// through.
pub(crate) fn output_or_decline(
    result: Result<String, ToolError>,
) -> Result<Option<String>, CancelledError> {
    match result {
        Ok(out) if out.trim().is_empty() => Ok(None),
        Ok(out) => Ok(Some(out)),
        Err(ToolError::Cancelled(err)) => Err(err),
        Err(err) => {
            tracing::debug!(%err, "tool declined");
            Ok(None)
        }
    }
}

/// The external tools found for one run. Probed fresh on every
/// [`Toolbox::discover`], never cached process-wide.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    pub exiftool: Option<ExternalTool>,
    pub ffprobe: Option<ExternalTool>,
}

impl Toolbox {
    pub fn discover(options: &ToolOptions) -> Self {
        Self {
            exiftool: ExternalTool::discover("exiftool", "-ver", options),
            ffprobe: ExternalTool::discover("ffprobe", "-version", options),
        }
    }

    /// No external tools at all.
    pub fn none() -> Self {
        Self::default()
    }
}
