use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "png", "tif", "tiff", "heic", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "3gp", "mpeg", "mpg", "hevc", "webm",
];

/// Extension-based classification; decides which metadata sources apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unclassified,
}

impl MediaKind {
    /// Classify by extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return MediaKind::Unclassified;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unclassified
        }
    }

    pub fn is_media(self) -> bool {
        self != MediaKind::Unclassified
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Path as discovered; renamed at most once.
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = MediaKind::from_path(&path);
        Self { path, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(MediaFile::new("a/IMG_0001.JPG").kind, MediaKind::Image);
        assert_eq!(MediaFile::new("b.heic").kind, MediaKind::Image);
        assert_eq!(MediaFile::new("clip.Mp4").kind, MediaKind::Video);
        assert_eq!(MediaFile::new("x.3gp").kind, MediaKind::Video);
        assert_eq!(MediaFile::new("notes.txt").kind, MediaKind::Unclassified);
        assert_eq!(MediaFile::new("README").kind, MediaKind::Unclassified);
        assert!(!MediaKind::Unclassified.is_media());
    }
}
