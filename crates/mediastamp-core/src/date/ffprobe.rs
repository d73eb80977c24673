use std::ffi::OsStr;

use chrono::NaiveDateTime;
use serde_json::Value;

use super::{parse_datetime, DateProvider, DateSource};
use crate::cancel::{CancellationToken, CancelledError};
use crate::media::{MediaFile, MediaKind};
use crate::tool::{output_or_decline, ExternalTool};

/// Spellings of the container creation tag seen across muxers and vendors.
pub const CREATION_TIME_KEYS: [&str; 4] = [
    "creation_time",
    "Creation_time",
    "com.apple.quicktime.creationdate",
    "DATE",
];

const ARGS: [&str; 6] = [
    "-v",
    "quiet",
    "-print_format",
    "json",
    "-show_entries",
    "format_tags=creation_time",
];

/// Asks `ffprobe` for the container-level creation time of a video.
pub struct FfProbeReader {
    tool: ExternalTool,
}

impl FfProbeReader {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

impl DateProvider for FfProbeReader {
    fn source(&self) -> DateSource {
        DateSource::FfProbe
    }

    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Video
    }

    fn extract(
        &self,
        file: &MediaFile,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<NaiveDateTime>, CancelledError> {
        let args: Vec<&OsStr> = ARGS
            .iter()
            .map(|arg| OsStr::new(*arg))
            .chain([file.path.as_os_str()])
            .collect();
        let output = output_or_decline(self.tool.run(&args, cancel))?;
        Ok(output.and_then(|json| date_from_ffprobe_json(&json)))
    }
}

/// Read `format.tags.<creation key>` from ffprobe's JSON output.
pub fn date_from_ffprobe_json(json: &str) -> Option<NaiveDateTime> {
    let value: Value = serde_json::from_str(json).ok()?;
    let tags = value.get("format")?.get("tags")?;

    CREATION_TIME_KEYS.iter().find_map(|key| {
        tags.get(*key)
            .and_then(Value::as_str)
            .and_then(|s| parse_datetime(s).ok())
    })
}
