pub mod exif;
pub mod exiftool;
pub mod ffprobe;
pub mod mtime;
pub mod parse;

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::cancel::{CancellationToken, CancelledError};
use crate::media::{MediaFile, MediaKind};

pub use parse::{parse_datetime, ParseError};

/// Where a timestamp came from, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    /// Tags dumped by the external `exiftool` binary.
    ExifTool,
    /// EXIF read directly out of the image container.
    EmbeddedExif,
    /// Container `creation_time` reported by `ffprobe`.
    FfProbe,
    /// Filesystem modification time.
    ModifiedTime,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateSource::ExifTool => "exiftool",
            DateSource::EmbeddedExif => "exif",
            DateSource::FfProbe => "ffprobe",
            DateSource::ModifiedTime => "mtime",
        };
        f.write_str(name)
    }
}

/// A resolved timestamp and the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResult {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

/// A metadata source that either produces a confident timestamp for a file or
/// declines.
///
/// Implementations absorb their own failures (missing tool, corrupt file,
/// unparseable value) and return `Ok(None)`. The only error that escapes is a
/// user cancellation observed while waiting on an external process.
pub trait DateProvider {
    fn source(&self) -> DateSource;

    /// Whether this source can say anything about files of `kind`.
    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    fn extract(
        &self,
        file: &MediaFile,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<NaiveDateTime>, CancelledError>;
}
