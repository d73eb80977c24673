use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Stem layout of a canonical name. Hyphens in the time keep it valid on
/// every filesystem.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

static CANONICAL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}-\d{2}-\d{2}\.[^.]+$").unwrap());

/// `2021-06-15 14-30-00`
pub fn canonical_stem(date: &NaiveDateTime) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// True for `YYYY-MM-DD HH-MM-SS.<ext>` exactly (no suffix, one extension).
pub fn is_canonical_name(file_name: &str) -> bool {
    CANONICAL_NAME_RE.is_match(file_name)
}

/// The rename itself failed. Carries the OS error message.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct RenameError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: io::Error,
}

fn candidate_name(stem: &str, counter: u32, ext: Option<&OsStr>) -> OsString {
    let mut name = OsString::from(stem);
    if counter > 0 {
        name.push(format!("_{counter}"));
    }
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

fn is_taken(path: &Path) -> bool {
    // symlink_metadata so a dangling symlink still counts as taken
    fs::symlink_metadata(path).is_ok()
}

/// First free `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... next to `src`.
///
/// The extension is kept byte for byte. `src` itself counts as free, so a file
/// that already carries the name it would get resolves to its own path.
pub fn next_free_path(src: &Path, stem: &str) -> PathBuf {
    let dir = src.parent().unwrap_or_else(|| Path::new(""));
    let ext = src.extension();

    let mut counter = 0u32;
    loop {
        let candidate = dir.join(candidate_name(stem, counter, ext));
        if candidate.as_path() == src || !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Rename `src` to the first free name for `stem` in the same directory.
///
/// Never overwrites. Returns the final path, which is `src` unchanged when the
/// file already holds that name.
pub fn safe_rename(src: &Path, stem: &str) -> Result<PathBuf, RenameError> {
    let dest = next_free_path(src, stem);
    if dest.as_path() == src {
        return Ok(dest);
    }
    match fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(source) => Err(RenameError {
            from: src.to_path_buf(),
            to: dest,
            source,
        }),
    }
}
