//! Source zip archive holding the collection's local files.
//!
//! The archive may also carry `collection.json` and `about.html` at its root;
//! they are used when no separate collection or about page is supplied.

use crate::collection::is_http_url;
use crate::http::{HttpError, RemoteSource};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use zip::ZipArchive;
use zip::result::ZipError;

/// Name of the manifest inside an archive.
pub const COLLECTION_MEMBER: &str = "collection.json";
/// Name of the optional about page inside an archive.
pub const ABOUT_MEMBER: &str = "about.html";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("Archive download failed: {0}")]
    Download(#[from] HttpError),
    #[error("Member not found in archive: {0}")]
    MissingMember(String),
    #[error("Member has an unsafe path: {0}")]
    UnsafeMember(String),
}

/// An opened source archive.
pub struct SourceArchive {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
}

impl std::fmt::Debug for SourceArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceArchive")
            .field("path", &self.path)
            .field("members", &self.zip.len())
            .finish()
    }
}

impl SourceArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Names of the file members; directory entries are left out.
    pub fn member_names(&self) -> BTreeSet<String> {
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.zip.index_for_name(member).is_some()
    }

    /// Read a member as UTF-8 text.
    pub fn read_to_string(&mut self, member: &str) -> Result<String, ArchiveError> {
        let mut entry = self.zip.by_name(member).map_err(|e| missing(e, member))?;
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Extract one member under `dest_dir`, keeping its relative path.
    ///
    /// Returns the path of the extracted file.
    pub fn extract(&mut self, member: &str, dest_dir: &Path) -> Result<PathBuf, ArchiveError> {
        let mut entry = self.zip.by_name(member).map_err(|e| missing(e, member))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafeMember(member.to_string()))?;
        let dest = dest_dir.join(relative);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;
        Ok(dest)
    }
}

fn missing(err: ZipError, member: &str) -> ArchiveError {
    match err {
        ZipError::FileNotFound => ArchiveError::MissingMember(member.to_string()),
        other => ArchiveError::Zip(other),
    }
}

/// Resolve `--archive` to a local path, downloading it first when it is a URL.
pub fn locate_archive(
    source: &str,
    output_dir: &Path,
    remote: &impl RemoteSource,
) -> Result<PathBuf, ArchiveError> {
    if !is_http_url(source) {
        return Ok(PathBuf::from(source));
    }
    let dest = output_dir.join("archive.zip");
    info!("Downloading archive at {source}");
    remote.download(source, &dest)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::MockRemote;
    use crate::test_helpers::{collection, members, write_zip};
    use crate::validate::scan_files;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn lists_members() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), &[("a.pdf", b"a"), ("vid/raw.mp4", b"video")]);
        let archive = SourceArchive::open(&path).unwrap();

        let names = archive.member_names();
        assert!(names.contains("a.pdf"));
        assert!(names.contains("vid/raw.mp4"));
        assert!(archive.contains("a.pdf"));
        assert!(!archive.contains("b.pdf"));
    }

    #[test]
    fn directory_entries_are_not_members() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dirs.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer
            .add_directory("vid/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("vid/raw.mp4", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"video").unwrap();
        writer.finish().unwrap();

        let archive = SourceArchive::open(&path).unwrap();
        let names = archive.member_names();
        assert_eq!(names, members(&["vid/raw.mp4"]));

        let c = collection(r#"[{"title": "Folder", "files": ["vid/"]}]"#);
        let report = scan_files(&c, Some(&names));
        assert_eq!(report.missing, vec!["vid/"]);
    }

    #[test]
    fn reads_member_as_text() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), &[(COLLECTION_MEMBER, b"[]")]);
        let mut archive = SourceArchive::open(&path).unwrap();
        assert_eq!(archive.read_to_string(COLLECTION_MEMBER).unwrap(), "[]");
    }

    #[test]
    fn extract_keeps_relative_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), &[("vid/raw.mp4", b"video")]);
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();

        let mut archive = SourceArchive::open(&path).unwrap();
        let extracted = archive.extract("vid/raw.mp4", &build).unwrap();

        assert_eq!(extracted, build.join("vid/raw.mp4"));
        assert_eq!(fs::read(&extracted).unwrap(), b"video");
    }

    #[test]
    fn missing_member_is_reported_by_name() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), &[("a.pdf", b"a")]);
        let mut archive = SourceArchive::open(&path).unwrap();

        let err = archive.extract("nope.pdf", tmp.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingMember(ref m) if m == "nope.pdf"));
    }

    #[test]
    fn not_a_zip_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.zip");
        fs::write(&path, "not a zip").unwrap();
        assert!(matches!(
            SourceArchive::open(&path),
            Err(ArchiveError::Zip(_))
        ));
    }

    #[test]
    fn local_archive_is_used_in_place() {
        let tmp = TempDir::new().unwrap();
        let remote = MockRemote::new();
        let path = locate_archive("/data/docs.zip", tmp.path(), &remote).unwrap();

        assert_eq!(path, PathBuf::from("/data/docs.zip"));
        assert!(remote.get_calls().is_empty());
    }

    #[test]
    fn remote_archive_is_downloaded_to_output() {
        let tmp = TempDir::new().unwrap();
        let remote = MockRemote::new().serving("https://example.com/docs.zip", b"PK");
        let path = locate_archive("https://example.com/docs.zip", tmp.path(), &remote).unwrap();

        assert_eq!(path, tmp.path().join("archive.zip"));
        assert_eq!(fs::read(&path).unwrap(), b"PK");
    }
}
