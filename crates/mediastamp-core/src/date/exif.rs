use std::path::Path;

use chrono::NaiveDateTime;

use super::{DateProvider, DateSource};
use crate::cancel::{CancellationToken, CancelledError};
use crate::media::{MediaFile, MediaKind};

/// Read the capture date embedded in an image file.
/// EXIF datetimes have no timezone info - they are local time as-is.
#[cfg(feature = "embedded-exif")]
pub fn extract_exif_date(path: &Path) -> Option<NaiveDateTime> {
    use exif::{In, Reader, Tag, Value};
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(path).ok()?;
    let exif = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    for tag in [Tag::DateTimeOriginal, Tag::DateTime] {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        // Raw value, not display_value(): the latter rewrites the date with dashes.
        let Value::Ascii(ref parts) = field.value else {
            continue;
        };
        let parsed = parts
            .iter()
            .filter_map(|raw| std::str::from_utf8(raw).ok())
            .find_map(|s| super::parse_datetime(s).ok());
        if parsed.is_some() {
            return parsed;
        }
    }

    None
}

/// Built without `embedded-exif`: this source never answers.
#[cfg(not(feature = "embedded-exif"))]
pub fn extract_exif_date(_path: &Path) -> Option<NaiveDateTime> {
    None
}

/// EXIF parsed in-process. No external process, images only.
pub struct EmbeddedExifReader;

impl DateProvider for EmbeddedExifReader {
    fn source(&self) -> DateSource {
        DateSource::EmbeddedExif
    }

    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Image
    }

    fn extract(
        &self,
        file: &MediaFile,
        _cancel: Option<&CancellationToken>,
    ) -> Result<Option<NaiveDateTime>, CancelledError> {
        let date = extract_exif_date(&file.path);
        if date.is_none() {
            tracing::trace!(path = %file.path.display(), "no embedded EXIF date");
        }
        Ok(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_corrupt_or_missing_files_decline() {
        let dir = tempdir().unwrap();
        let garbage = dir.path().join("broken.jpg");
        std::fs::write(&garbage, b"\xFF\xD8 definitely not a jpeg").unwrap();
        let plain = dir.path().join("plain.png");
        std::fs::write(&plain, b"\x89PNG\r\n\x1a\n").unwrap();

        assert_eq!(extract_exif_date(&garbage), None);
        assert_eq!(extract_exif_date(&plain), None);
        assert_eq!(extract_exif_date(&dir.path().join("missing.jpg")), None);
    }

    #[test]
    fn test_only_images() {
        assert!(EmbeddedExifReader.supports(MediaKind::Image));
        assert!(!EmbeddedExifReader.supports(MediaKind::Video));
        assert!(!EmbeddedExifReader.supports(MediaKind::Unclassified));
    }
}
