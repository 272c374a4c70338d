//! Collection manifest: entries, file references and their normalization.
//!
//! A collection is a JSON array of entries. Each entry owns an ordered list of
//! files, and each file is referenced in one of two shapes:
//!
//! ```json
//! [
//!   {
//!     "title": "Intro course",
//!     "description": "optional",
//!     "authors": "optional",
//!     "files": [
//!       "slides.pdf",
//!       {"url": "https://example.com/video.mp4", "filename": "intro.mp4"},
//!       {"archive-member": "vid/raw.mp4"}
//!     ]
//!   }
//! ]
//! ```
//!
//! - **Bare name** (legacy): the string is both the archive member and the
//!   target filename.
//! - **Located**: exactly one of `archive-member` / `url`, plus an optional
//!   `filename` override for the target path.
//!
//! Every stage (reachability, validation, streaming, index) goes through
//! [`FileRef::normalize`] so the "which field wins" policy lives in one place.
//!
//! Entries without files are dropped when the collection is loaded; nothing
//! downstream ever sees them.

use reqwest::Url;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Namespace under which every collection file is stored in the package.
pub const FILES_NAMESPACE: &str = "files";

/// Title shown for entries that have none.
pub const UNKNOWN_TITLE: &str = "Unknown?";

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Collection JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed file entry in \"{title}\": {reason}")]
    MalformedEntry {
        title: String,
        reason: MalformedReason,
    },
}

/// Why a located file reference could not be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("archive-member and url are both missing")]
    NoLocator,
    #[error("archive-member and url are both set")]
    BothLocators,
    #[error("no filename can be derived from {0}")]
    NoFilename(String),
}

/// A single file reference as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileRef {
    /// Legacy form: archive member name and target filename at once.
    BareName(String),
    /// Structured form with an explicit source locator.
    Located(Locator),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Locator {
    #[serde(rename = "archive-member", default)]
    pub archive_member: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Canonical `(source_uri, target_filename)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFile {
    /// URL or archive member name.
    pub uri: String,
    /// Target filename inside the package, before unicode normalization.
    pub filename: String,
}

impl ResolvedFile {
    pub fn is_remote(&self) -> bool {
        is_http_url(&self.uri)
    }

    /// Path of this file inside the package (`files/<normalized filename>`).
    pub fn package_path(&self) -> String {
        package_path(&self.filename)
    }
}

impl FileRef {
    /// Convert to the canonical `(uri, filename)` pair.
    ///
    /// - bare name `"a.pdf"` → `("a.pdf", "a.pdf")`
    /// - `{"url": "https://x/y/v.mp4"}` → `("https://x/y/v.mp4", "v.mp4")`
    /// - `{"archive-member": "vid/raw.mp4", "filename": "intro.mp4"}`
    ///   → `("vid/raw.mp4", "intro.mp4")`
    ///
    /// Empty strings count as absent.
    pub fn normalize(&self) -> Result<ResolvedFile, MalformedReason> {
        match self {
            FileRef::BareName(name) if name.is_empty() => Err(MalformedReason::NoLocator),
            FileRef::BareName(name) => Ok(ResolvedFile {
                uri: name.clone(),
                filename: name.clone(),
            }),
            FileRef::Located(locator) => locator.normalize(),
        }
    }

    /// The URL locator, if this is a located reference carrying one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FileRef::Located(locator) => non_empty(&locator.url),
            FileRef::BareName(_) => None,
        }
    }
}

impl Locator {
    fn normalize(&self) -> Result<ResolvedFile, MalformedReason> {
        let (uri, derived) = match (non_empty(&self.archive_member), non_empty(&self.url)) {
            (Some(_), Some(_)) => return Err(MalformedReason::BothLocators),
            (None, None) => return Err(MalformedReason::NoLocator),
            (Some(member), None) => (member, Some(member.to_string())),
            (None, Some(url)) => (url, url_filename(url)),
        };

        let filename = match non_empty(&self.filename) {
            Some(name) => name.to_string(),
            None => derived.ok_or_else(|| MalformedReason::NoFilename(uri.to_string()))?,
        };

        Ok(ResolvedFile {
            uri: uri.to_string(),
            filename,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Last non-empty path segment of a URL, query and fragment excluded.
fn url_filename(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_string);
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Whether a source locator is an HTTP(S) URL.
pub fn is_http_url(uri: &str) -> bool {
    let lower = uri.get(..8).unwrap_or(uri).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Unicode-normalize (NFKC) a filename so package paths are stable across
/// platforms that store names decomposed or composed.
pub fn normalized_path(path: &str) -> String {
    path.nfkc().collect()
}

/// Package path for a target filename.
pub fn package_path(filename: &str) -> String {
    format!("{}/{}", FILES_NAMESPACE, normalized_path(filename))
}

/// One titled item of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRef>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FileRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FileRef>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CollectionEntry {
    /// Title for display and error reports; placeholder when absent.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_TITLE)
    }

    /// Normalize every file of this entry, failing on the first malformed one.
    pub fn resolved_files(&self) -> Result<Vec<ResolvedFile>, CollectionError> {
        self.files
            .iter()
            .map(|file| {
                file.normalize()
                    .map_err(|reason| CollectionError::MalformedEntry {
                        title: self.display_title().to_string(),
                        reason,
                    })
            })
            .collect()
    }
}

/// The loaded manifest: entries with at least one file, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    entries: Vec<CollectionEntry>,
}

impl Collection {
    pub fn new(entries: Vec<CollectionEntry>) -> Self {
        Self {
            entries: entries.into_iter().filter(|e| !e.files.is_empty()).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CollectionError> {
        let entries: Vec<CollectionEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self, CollectionError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|e| e.files.len()).sum()
    }

    /// Every file reference, paired with its owning entry, in manifest order.
    pub fn files(&self) -> impl Iterator<Item = (&CollectionEntry, &FileRef)> {
        self.entries
            .iter()
            .flat_map(|entry| entry.files.iter().map(move |file| (entry, file)))
    }

    /// Every URL locator in the collection, in manifest order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.files().filter_map(|(_, file)| file.url())
    }
}
