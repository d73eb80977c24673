use std::path::Path;

use anyhow::{bail, Context};
use walkdir::WalkDir;

use crate::media::MediaFile;

/// Collect media files under `folder`, sorted by name within each directory.
///
/// Only the top level unless `recursive`. The listing is taken up front, so
/// files renamed during the run are never visited twice.
pub fn discover_media(folder: &Path, recursive: bool) -> anyhow::Result<Vec<MediaFile>> {
    let meta = std::fs::metadata(folder)
        .with_context(|| format!("cannot read folder {}", folder.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory", folder.display());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut media = Vec::new();
    for entry in WalkDir::new(folder).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file = MediaFile::new(entry.into_path());
        if file.kind.is_media() {
            media.push(file);
        }
    }
    Ok(media)
}
