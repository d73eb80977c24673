use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use filetime::FileTime;

use super::{DateProvider, DateSource};
use crate::cancel::{CancellationToken, CancelledError};
use crate::media::MediaFile;

/// Filesystem modification time as local wall-clock time.
///
/// Least trustworthy source: copies and transfers reset it.
pub fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let meta = fs::metadata(path).ok()?;
    let mtime = FileTime::from_last_modification_time(&meta);
    let utc = DateTime::from_timestamp(mtime.unix_seconds(), 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}

/// Last-resort fallback, only installed when enabled.
pub struct ModifiedTime;

impl DateProvider for ModifiedTime {
    fn source(&self) -> DateSource {
        DateSource::ModifiedTime
    }

    fn extract(
        &self,
        file: &MediaFile,
        _cancel: Option<&CancellationToken>,
    ) -> Result<Option<NaiveDateTime>, CancelledError> {
        Ok(modified_time(&file.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_modified_time_is_local() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.jpg");
        fs::write(&path, b"x").unwrap();

        let expected = NaiveDate::from_ymd_opt(2012, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap();
        let local = expected.and_local_timezone(Local).single().unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(local.timestamp(), 0)).unwrap();

        assert_eq!(modified_time(&path), Some(expected));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(modified_time(&dir.path().join("gone.mp4")), None);
    }
}
