use std::ffi::OsStr;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use super::{parse_datetime, DateProvider, DateSource};
use crate::cancel::{CancellationToken, CancelledError};
use crate::media::MediaFile;
use crate::tool::{output_or_decline, ExternalTool};

/// Tags tried in order: capture time, then container creation, then
/// modification.
pub const TAG_PRIORITY: [&str; 8] = [
    "DateTimeOriginal",
    "CreateDate",
    "MediaCreateDate",
    "TrackCreateDate",
    "ModifyDate",
    "FileModifyDate",
    "CreationDate",
    "Create Date",
];

/// Reads every tag with `exiftool -j` and picks the best date among them.
pub struct ExifToolReader {
    tool: ExternalTool,
}

impl ExifToolReader {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

impl DateProvider for ExifToolReader {
    fn source(&self) -> DateSource {
        DateSource::ExifTool
    }

    fn extract(
        &self,
        file: &MediaFile,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<NaiveDateTime>, CancelledError> {
        let args = [OsStr::new("-j"), file.path.as_os_str()];
        let output = output_or_decline(self.tool.run(&args, cancel))?;
        Ok(output.and_then(|json| date_from_exiftool_json(&json)))
    }
}

/// Pick a date out of `exiftool -j` output (an array with one object per file).
///
/// Known tags first. Failing that, any string tag that parses as a date is
/// taken, which is loose: a free-text tag that happens to hold a date wins.
pub fn date_from_exiftool_json(json: &str) -> Option<NaiveDateTime> {
    let records: Vec<Map<String, Value>> = serde_json::from_str(json).ok()?;
    let record = records.into_iter().next()?;

    let parse = |value: &Value| value.as_str().and_then(|s| parse_datetime(s).ok());

    TAG_PRIORITY
        .iter()
        .find_map(|tag| record.get(*tag).and_then(parse))
        .or_else(|| record.values().find_map(parse))
}
