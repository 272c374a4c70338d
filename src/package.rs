//! Output package writer.
//!
//! [`PackageWriter`] is the sink the pipeline writes into: files staged on disk
//! (optionally deleted once ingested) and in-memory content with a mimetype.
//! [`ZipPackage`] is the shipped implementation: a single zip container laid
//! out like a ZIM namespace tree:
//!
//! ```text
//! package.zim
//! ├── home                     # main page (HTML shell)
//! ├── init.js                  # UI settings
//! ├── database.js              # search index literal
//! ├── assets/…                 # static client UI
//! ├── favicon.png, favicon.ico, main-logo.png, …
//! ├── files/…                  # every collection file
//! └── M/…                      # metadata (Title, Language, Counter, …)
//! ```
//!
//! Paths are unique: adding a path twice keeps the first item and logs a
//! warning.

use crate::metadata::PackageMetadata;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Namespace of metadata entries.
pub const METADATA_NAMESPACE: &str = "M";

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),
}

/// Destination of every item produced by a run.
pub trait PackageWriter {
    /// Ingest a file from disk, deleting it afterwards when `delete_fpath` is set.
    fn add_file(&mut self, path: &str, fpath: &Path, delete_fpath: bool)
    -> Result<(), PackageError>;

    /// Ingest in-memory content.
    fn add_content(&mut self, path: &str, content: &[u8], mimetype: &str)
    -> Result<(), PackageError>;
}

/// Guess a mimetype from a path's extension.
pub fn mimetype_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "js" => "text/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Text compresses well; media is already compressed and stored as-is.
fn compression_for(mimetype: &str) -> CompressionMethod {
    let compressible = mimetype.starts_with("text/")
        || mimetype == "application/json"
        || mimetype == "image/svg+xml";
    if compressible {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    }
}

/// Single-file zip package.
pub struct ZipPackage {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    metadata: PackageMetadata,
    main_path: String,
    added: HashSet<String>,
    counter: BTreeMap<String, usize>,
}

impl ZipPackage {
    /// Create the package file, truncating any previous one.
    pub fn create(
        path: &Path,
        metadata: PackageMetadata,
        main_path: &str,
    ) -> Result<Self, PackageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(BufWriter::new(file)),
            metadata,
            main_path: main_path.to_string(),
            added: HashSet::new(),
            counter: BTreeMap::new(),
        })
    }

    /// Number of items added so far (metadata excluded).
    pub fn item_count(&self) -> usize {
        self.added.len()
    }

    /// Register a path, returning false when it was already added.
    fn claim(&mut self, path: &str, mimetype: &str) -> bool {
        if !self.added.insert(path.to_string()) {
            warn!("Skipping duplicate package path: {path}");
            return false;
        }
        *self.counter.entry(mimetype.to_string()).or_default() += 1;
        true
    }

    fn start(&mut self, path: &str, mimetype: &str) -> Result<(), PackageError> {
        let options = SimpleFileOptions::default().compression_method(compression_for(mimetype));
        self.writer.start_file(path, options)?;
        Ok(())
    }

    /// `Counter` metadata: `mimetype=count` pairs joined by `;`.
    fn counter_value(&self) -> String {
        self.counter
            .iter()
            .map(|(mime, count)| format!("{mime}={count}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Write metadata entries and close the container.
    pub fn finish(mut self) -> Result<PathBuf, PackageError> {
        let mut entries = self.metadata.entries();
        entries.push(("MainPath", self.main_path.clone().into_bytes()));
        entries.push(("Counter", self.counter_value().into_bytes()));

        for (key, value) in entries {
            self.start(&format!("{METADATA_NAMESPACE}/{key}"), "text/plain")?;
            self.writer.write_all(&value)?;
        }

        let mut inner = self.writer.finish()?;
        inner.flush()?;
        Ok(self.path)
    }
}

impl PackageWriter for ZipPackage {
    fn add_file(
        &mut self,
        path: &str,
        fpath: &Path,
        delete_fpath: bool,
    ) -> Result<(), PackageError> {
        let mimetype = mimetype_for(path);
        if self.claim(path, mimetype) {
            debug!("> {path}");
            self.start(path, mimetype)?;
            let mut source = File::open(fpath)?;
            io::copy(&mut source, &mut self.writer)?;
        }
        if delete_fpath {
            fs::remove_file(fpath)?;
        }
        Ok(())
    }

    fn add_content(
        &mut self,
        path: &str,
        content: &[u8],
        mimetype: &str,
    ) -> Result<(), PackageError> {
        if self.claim(path, mimetype) {
            debug!("> {path}");
            self.start(path, mimetype)?;
            self.writer.write_all(content)?;
        }
        Ok(())
    }
}
