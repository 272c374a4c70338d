//! Shared test utilities.
//!
//! Builders for collections and source archives, plus readers for the zip
//! packages produced by the pipeline.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let archive = write_zip(tmp.path(), &[("a.pdf", b"aaa")]);
//! let c = collection(r#"[{"title": "A", "files": ["a.pdf"]}]"#);
//! ```

use crate::collection::Collection;
use crate::metadata::PackageMetadata;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

// =========================================================================
// Inputs
// =========================================================================

/// Parse a collection manifest, panicking on invalid JSON.
pub fn collection(json: &str) -> Collection {
    Collection::from_json(json).unwrap()
}

/// Archive member listing.
pub fn members(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Write `source.zip` in `dir` with the given members.
pub fn write_zip(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join("source.zip");
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    path
}

pub fn sample_metadata() -> PackageMetadata {
    PackageMetadata {
        name: "test".to_string(),
        title: "Test Collection".to_string(),
        description: "A test collection".to_string(),
        long_description: None,
        language: "eng".to_string(),
        tags: vec!["_category:other".to_string(), "test".to_string()],
        creator: "Unknown".to_string(),
        publisher: "openZIM".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        scraper: "nautilus-zim test".to_string(),
        illustration: b"png".to_vec(),
    }
}

// =========================================================================
// Package inspection
// =========================================================================

pub fn zip_member_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

pub fn read_zip_member(path: &Path, member: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive
        .by_name(member)
        .unwrap_or_else(|_| panic!("member '{member}' not in {}", path.display()));
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}
