#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mediastamp_core::{ProcessOptions, ToolOptions};

const EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&value.to_be_bytes());
}

fn ascii(s: &str) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// A JPEG holding only an APP1 EXIF segment with the given date tags.
///
/// `original` goes to DateTimeOriginal (EXIF IFD), `modified` to DateTime
/// (IFD0). Values are written verbatim, e.g. `2021:06:15 14:30:00`.
pub fn jpeg_with_exif(original: Option<&str>, modified: Option<&str>) -> Vec<u8> {
    let ifd0_entries = original.is_some() as u32 + modified.is_some() as u32;
    let ifd0_len = 2 + 12 * ifd0_entries + 4;
    let exif_ifd_offset = 8 + ifd0_len;
    let exif_ifd_len = if original.is_some() { 2 + 12 + 4 } else { 0 };
    let mut data_offset = exif_ifd_offset + exif_ifd_len;

    let modified = modified.map(ascii);
    let original = original.map(ascii);

    let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
    let mut data = Vec::new();

    // IFD0, entries sorted by tag
    tiff.extend_from_slice(&(ifd0_entries as u16).to_be_bytes());
    if let Some(value) = &modified {
        ifd_entry(&mut tiff, TAG_DATE_TIME, TYPE_ASCII, value.len() as u32, data_offset);
        data_offset += value.len() as u32;
        data.extend_from_slice(value);
    }
    if original.is_some() {
        ifd_entry(&mut tiff, EXIF_IFD_POINTER, TYPE_LONG, 1, exif_ifd_offset);
    }
    tiff.extend_from_slice(&0u32.to_be_bytes());

    if let Some(value) = &original {
        tiff.extend_from_slice(&1u16.to_be_bytes());
        ifd_entry(&mut tiff, TAG_DATE_TIME_ORIGINAL, TYPE_ASCII, value.len() as u32, data_offset);
        tiff.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(value);
    }
    tiff.extend_from_slice(&data);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

pub fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write test file");
    path
}

/// Options that only ever look for tools in `tool_dir`.
pub fn options_with_tools(folder: &Path, tool_dir: &Path) -> ProcessOptions {
    ProcessOptions {
        folder: folder.to_path_buf(),
        tools: ToolOptions {
            dir: Some(tool_dir.to_path_buf()),
            search_path: false,
            timeout_secs: 10,
        },
        ..ProcessOptions::default()
    }
}

/// Sorted file names in `dir`.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
