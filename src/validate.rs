//! Consistency validation of a collection before anything is written.
//!
//! A single scanning pass ([`scan_files`]) normalizes every file reference and
//! accumulates findings into a [`FileReport`]; the report is turned into one
//! aggregated [`ValidationError`] at the end. Nothing is reported one at a time.
//!
//! ## Rules
//!
//! - **Duplicates**: a target filename used more than once anywhere in the
//!   collection is a duplicate, whether or not both occurrences point at the
//!   same source. Every occurrence is listed.
//! - **Malformed entries** (neither or both locators) are recorded as missing,
//!   by the owning entry's title.
//! - **Archive-backed runs**: a non-URL source absent from the archive member
//!   listing is missing.
//! - **Archive-less runs**: there is nothing to extract from, so every source
//!   must be a URL and the collection must not be empty.
//!
//! The two modes intentionally stay separate: without an archive a local
//! reference can never be satisfied.

use crate::collection::{Collection, ResolvedFile, normalized_path};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", describe_findings(.missing, .duplicates, .archive_members))]
    Inconsistent {
        missing: Vec<String>,
        duplicates: Vec<String>,
        /// Archive listing shown alongside missing files, empty when archive-less.
        archive_members: Vec<String>,
    },
    #[error("Collection is empty")]
    EmptyCollection,
    #[error("File(s) referenced in collection which are not urls:{}", bullets(.uris))]
    NonUrlSources { uris: Vec<String> },
}

fn bullets(items: &[String]) -> String {
    items.iter().map(|i| format!("\n - {i}")).collect()
}

fn describe_findings(missing: &[String], duplicates: &[String], members: &[String]) -> String {
    let mut sections = Vec::new();
    if !missing.is_empty() {
        let mut section = format!(
            "File(s) referenced in collection which are missing:{}",
            bullets(missing)
        );
        if !members.is_empty() {
            section.push_str("\n FYI, here is the list of all members in archive:");
            for member in members {
                section.push_str(&format!("\n - {member} -- {member:?}"));
            }
        }
        sections.push(section);
    }
    if !duplicates.is_empty() {
        sections.push(format!(
            "Files in collection which are duplicate:{}",
            bullets(duplicates)
        ));
    }
    sections.join("\n")
}

/// Findings of one scanning pass over the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    /// Every successfully normalized file, in manifest order.
    pub resolved: Vec<ResolvedFile>,
    /// Missing archive members and titles of malformed entries.
    pub missing: Vec<String>,
    /// Every occurrence of a target filename used more than once.
    pub duplicates: Vec<String>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicates.is_empty()
    }
}

/// Normalize every file of the collection and accumulate findings.
///
/// With `available` set, non-URL sources absent from it are reported missing.
pub fn scan_files(collection: &Collection, available: Option<&BTreeSet<String>>) -> FileReport {
    let mut report = FileReport::default();

    for entry in collection.entries() {
        let resolved = match entry.resolved_files() {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("{e}");
                report.missing.push(entry.display_title().to_string());
                continue;
            }
        };
        for file in resolved {
            if let Some(members) = available
                && !file.is_remote()
                && !members.contains(&file.uri)
            {
                report.missing.push(file.uri.clone());
            }
            report.resolved.push(file);
        }
    }

    // Collisions are decided on the package path, not the raw filename.
    let targets: Vec<String> = report
        .resolved
        .iter()
        .map(|r| normalized_path(&r.filename))
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for target in &targets {
        *counts.entry(target.as_str()).or_default() += 1;
    }
    report.duplicates = report
        .resolved
        .iter()
        .zip(&targets)
        .filter(|(_, target)| counts[target.as_str()] > 1)
        .map(|(r, _)| r.filename.clone())
        .collect();

    report
}

/// Validate a collection whose local files come from an archive.
pub fn validate_archive_collection(
    collection: &Collection,
    members: &BTreeSet<String>,
) -> Result<Vec<ResolvedFile>, ValidationError> {
    let report = scan_files(collection, Some(members));
    if report.is_clean() {
        return Ok(report.resolved);
    }
    Err(ValidationError::Inconsistent {
        missing: report.missing,
        duplicates: report.duplicates,
        archive_members: members.iter().cloned().collect(),
    })
}

/// Validate a collection without any archive: only remote sources are legal.
pub fn validate_archiveless_collection(
    collection: &Collection,
) -> Result<Vec<ResolvedFile>, ValidationError> {
    let report = scan_files(collection, None);

    if report.resolved.is_empty() && report.missing.is_empty() {
        return Err(ValidationError::EmptyCollection);
    }

    let local: Vec<String> = report
        .resolved
        .iter()
        .filter(|r| !r.is_remote())
        .map(|r| r.uri.clone())
        .collect();
    if !local.is_empty() {
        return Err(ValidationError::NonUrlSources { uris: local });
    }

    if report.is_clean() {
        return Ok(report.resolved);
    }
    Err(ValidationError::Inconsistent {
        missing: report.missing,
        duplicates: report.duplicates,
        archive_members: Vec::new(),
    })
}

/// Dispatch to the archive-backed or archive-less rules.
pub fn validate(
    collection: &Collection,
    archive_members: Option<&BTreeSet<String>>,
) -> Result<Vec<ResolvedFile>, ValidationError> {
    match archive_members {
        Some(members) => validate_archive_collection(collection, members),
        None => validate_archiveless_collection(collection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{collection, members};

    // =========================================================================
    // scan_files
    // =========================================================================

    #[test]
    fn scan_resolves_in_manifest_order() {
        let c = collection(
            r#"[
                {"title": "A", "files": ["a.pdf", {"archive-member": "vid/raw.mp4", "filename": "intro.mp4"}]},
                {"title": "B", "files": [{"url": "https://example.com/b.mp4"}]}
            ]"#,
        );
        let report = scan_files(&c, None);

        let filenames: Vec<&str> = report.resolved.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(filenames, vec!["a.pdf", "intro.mp4", "b.mp4"]);
        assert!(report.is_clean());
    }

    #[test]
    fn malformed_entry_recorded_by_title() {
        let c = collection(
            r#"[
                {"title": "Neither", "files": [{"filename": "x.pdf"}]},
                {"title": "Both", "files": [{"url": "https://e.com/y.pdf", "archive-member": "y.pdf"}]},
                {"title": "Fine", "files": ["z.pdf"]}
            ]"#,
        );
        let report = scan_files(&c, None);

        assert_eq!(report.missing, vec!["Neither", "Both"]);
        assert_eq!(report.resolved.len(), 1);
    }

    #[test]
    fn duplicates_list_every_occurrence() {
        let c = collection(
            r#"[
                {"title": "A", "files": ["doc.pdf", "a.pdf"]},
                {"title": "B", "files": [{"archive-member": "other/doc.pdf", "filename": "doc.pdf"}]}
            ]"#,
        );
        let report = scan_files(&c, None);
        assert_eq!(report.duplicates, vec!["doc.pdf", "doc.pdf"]);
    }

    #[test]
    fn same_source_twice_is_still_duplicate() {
        let c = collection(r#"[{"title": "A", "files": ["a.pdf"]}, {"title": "B", "files": ["a.pdf"]}]"#);
        assert_eq!(scan_files(&c, None).duplicates, vec!["a.pdf", "a.pdf"]);
    }

    #[test]
    fn filenames_equal_after_normalization_collide() {
        let c = collection(
            "[
                {\"title\": \"A\", \"files\": [{\"url\": \"https://e.com/1\", \"filename\": \"caf\u{00e9}.pdf\"}]},
                {\"title\": \"B\", \"files\": [{\"url\": \"https://e.com/2\", \"filename\": \"cafe\u{0301}.pdf\"}]}
            ]",
        );
        let err = validate_archiveless_collection(&c).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Inconsistent {
                missing: vec![],
                duplicates: vec!["caf\u{00e9}.pdf".into(), "cafe\u{0301}.pdf".into()],
                archive_members: vec![],
            }
        );
    }

    #[test]
    fn missing_members_detected_against_listing() {
        let c = collection(
            r#"[{"title": "A", "files": ["a.pdf", {"archive-member": "b.pdf"}, {"url": "https://e.com/c.pdf"}]}]"#,
        );
        let report = scan_files(&c, Some(&members(&["a.pdf"])));
        assert_eq!(report.missing, vec!["b.pdf"]);
    }

    // =========================================================================
    // Archive-backed validation
    // =========================================================================

    #[test]
    fn archive_collection_passes_when_consistent() {
        let c = collection(r#"[{"title": "A", "files": ["a.pdf"]}]"#);
        let resolved = validate_archive_collection(&c, &members(&["a.pdf"])).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].package_path(), "files/a.pdf");
    }

    #[test]
    fn archive_collection_reports_missing_and_duplicates_together() {
        let c = collection(
            r#"[
                {"title": "A", "files": ["doc.pdf", "gone.pdf"]},
                {"title": "B", "files": ["doc.pdf"]}
            ]"#,
        );
        let err = validate_archive_collection(&c, &members(&["doc.pdf"])).unwrap_err();

        assert_eq!(
            err,
            ValidationError::Inconsistent {
                missing: vec!["gone.pdf".into()],
                duplicates: vec!["doc.pdf".into(), "doc.pdf".into()],
                archive_members: vec!["doc.pdf".into()],
            }
        );
        let message = err.to_string();
        assert!(message.contains("which are missing:\n - gone.pdf"));
        assert!(message.contains("FYI, here is the list of all members in archive:"));
        assert!(message.contains("which are duplicate:\n - doc.pdf\n - doc.pdf"));
    }

    #[test]
    fn empty_archive_makes_every_local_file_missing() {
        let c = collection(r#"[{"title": "A", "files": ["a.pdf", "b.pdf"]}]"#);
        let err = validate_archive_collection(&c, &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Inconsistent { ref missing, .. } if missing == &["a.pdf", "b.pdf"]
        ));
    }

    #[test]
    fn archive_collection_allows_remote_files() {
        let c = collection(r#"[{"title": "A", "files": ["a.pdf", {"url": "https://e.com/b.mp4"}]}]"#);
        assert!(validate_archive_collection(&c, &members(&["a.pdf"])).is_ok());
    }

    // =========================================================================
    // Archive-less validation
    // =========================================================================

    #[test]
    fn archiveless_accepts_only_urls() {
        let c = collection(
            r#"[{"title": "A", "files": [{"url": "https://e.com/a.mp4"}, {"url": "https://e.com/b.mp4"}]}]"#,
        );
        assert_eq!(validate_archiveless_collection(&c).unwrap().len(), 2);
    }

    #[test]
    fn archiveless_rejects_local_references() {
        let c = collection(
            r#"[
                {"title": "A", "files": [{"url": "https://e.com/a.mp4"}, "local.pdf"]},
                {"title": "B", "files": [{"archive-member": "vid/b.mp4"}]}
            ]"#,
        );
        assert_eq!(
            validate_archiveless_collection(&c).unwrap_err(),
            ValidationError::NonUrlSources {
                uris: vec!["local.pdf".into(), "vid/b.mp4".into()]
            }
        );
    }

    #[test]
    fn archiveless_proceeds_once_local_reference_removed() {
        let with_local = collection(
            r#"[{"title": "A", "files": [{"url": "https://e.com/a.mp4"}, "local.pdf"]}]"#,
        );
        assert!(validate_archiveless_collection(&with_local).is_err());

        let without = collection(r#"[{"title": "A", "files": [{"url": "https://e.com/a.mp4"}]}]"#);
        assert!(validate_archiveless_collection(&without).is_ok());
    }

    #[test]
    fn archiveless_empty_collection_fails() {
        let c = collection(r#"[{"title": "A", "files": []}]"#);
        assert_eq!(
            validate_archiveless_collection(&c).unwrap_err(),
            ValidationError::EmptyCollection
        );
    }

    #[test]
    fn archiveless_duplicates_reported() {
        let c = collection(
            r#"[
                {"title": "A", "files": [{"url": "https://one.example/doc.pdf"}]},
                {"title": "B", "files": [{"url": "https://two.example/doc.pdf"}]}
            ]"#,
        );
        let err = validate_archiveless_collection(&c).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Inconsistent {
                missing: vec![],
                duplicates: vec!["doc.pdf".into(), "doc.pdf".into()],
                archive_members: vec![],
            }
        );
    }

    #[test]
    fn archiveless_malformed_entry_reported_as_missing() {
        let c = collection(
            r#"[{"title": "Broken", "files": [{"url": "https://e.com/a.mp4", "archive-member": "a.mp4"}]}]"#,
        );
        assert!(matches!(
            validate_archiveless_collection(&c).unwrap_err(),
            ValidationError::Inconsistent { ref missing, .. } if missing == &["Broken"]
        ));
    }

    #[test]
    fn validate_dispatches_on_archive_presence() {
        let c = collection(r#"[{"title": "A", "files": ["a.pdf"]}]"#);
        assert!(validate(&c, Some(&members(&["a.pdf"]))).is_ok());
        assert!(matches!(
            validate(&c, None),
            Err(ValidationError::NonUrlSources { .. })
        ));
    }
}
