//! Up-front reachability check for every remote file of a collection.
//!
//! Runs once, before anything is downloaded or extracted. Every URL locator is
//! checked and every failure is collected, so a manifest with fifty broken
//! links reports all fifty in a single run.

use crate::collection::{Collection, is_http_url};
use crate::http::{ProbeFailure, RemoteSource};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error};

/// A URL that failed the reachability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlFailure {
    NotHttp { url: String },
    Connection { url: String, reason: String },
    Status { url: String, status: u16 },
}

impl UrlFailure {
    pub fn url(&self) -> &str {
        match self {
            UrlFailure::NotHttp { url }
            | UrlFailure::Connection { url, .. }
            | UrlFailure::Status { url, .. } => url,
        }
    }
}

impl fmt::Display for UrlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlFailure::NotHttp { url } => write!(f, "Not a valid HTTP URL: {url}"),
            UrlFailure::Connection { url, reason } => {
                write!(f, "Connection Error: {url} ({reason})")
            }
            UrlFailure::Status { url, status } => write!(f, "HTTP {status}: {url}"),
        }
    }
}

#[derive(Error, Debug)]
#[error("Remote entries failed access test:{}", bullet_list(.failures))]
pub struct RemoteAccessError {
    pub failures: Vec<UrlFailure>,
}

fn bullet_list(failures: &[UrlFailure]) -> String {
    failures.iter().map(|f| format!("\n - {f}")).collect()
}

/// Check one URL.
pub fn check_url(url: &str, remote: &impl RemoteSource) -> Result<(), UrlFailure> {
    if !is_http_url(url) {
        return Err(UrlFailure::NotHttp {
            url: url.to_string(),
        });
    }
    remote.probe(url).map_err(|failure| match failure {
        ProbeFailure::Connection(reason) => UrlFailure::Connection {
            url: url.to_string(),
            reason,
        },
        ProbeFailure::Status(status) => UrlFailure::Status {
            url: url.to_string(),
            status,
        },
    })
}

/// Check every URL locator of the collection, in manifest order.
///
/// Bare names and archive members are skipped. Succeeds silently when all
/// URLs respond with a 2xx status.
pub fn check_all(
    collection: &Collection,
    remote: &impl RemoteSource,
) -> Result<(), RemoteAccessError> {
    let mut failures = Vec::new();

    for url in collection.urls() {
        debug!("> probing {url}");
        if let Err(failure) = check_url(url, remote) {
            error!("- {failure}");
            failures.push(failure);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(RemoteAccessError { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::{MockRemote, RecordedCall};
    use crate::test_helpers::collection;

    #[test]
    fn all_reachable_passes() {
        let c = collection(
            r#"[{"title": "A", "files": [
                {"url": "https://example.com/a.mp4"},
                {"url": "https://example.com/b.mp4"}
            ]}]"#,
        );
        let remote = MockRemote::new()
            .serving("https://example.com/a.mp4", b"a")
            .serving("https://example.com/b.mp4", b"b");

        assert!(check_all(&c, &remote).is_ok());
        assert_eq!(remote.get_calls().len(), 2);
    }

    #[test]
    fn collects_every_failure_before_reporting() {
        let c = collection(
            r#"[
                {"title": "A", "files": [{"url": "https://example.com/missing.mp4"}]},
                {"title": "B", "files": [{"url": "ftp://example.com/b.mp4"}]},
                {"title": "C", "files": [{"url": "https://down.example.com/c.mp4"}]},
                {"title": "D", "files": [{"url": "https://example.com/ok.mp4"}]}
            ]"#,
        );
        let remote = MockRemote::new()
            .serving("https://example.com/ok.mp4", b"ok")
            .failing(
                "https://down.example.com/c.mp4",
                ProbeFailure::Connection("dns error".into()),
            );

        let err = check_all(&c, &remote).unwrap_err();
        assert_eq!(
            err.failures,
            vec![
                UrlFailure::Status {
                    url: "https://example.com/missing.mp4".into(),
                    status: 404
                },
                UrlFailure::NotHttp {
                    url: "ftp://example.com/b.mp4".into()
                },
                UrlFailure::Connection {
                    url: "https://down.example.com/c.mp4".into(),
                    reason: "dns error".into()
                },
            ]
        );
    }

    #[test]
    fn non_http_url_is_never_probed() {
        let c = collection(r#"[{"title": "A", "files": [{"url": "file:///etc/x.mp4"}]}]"#);
        let remote = MockRemote::new();

        assert!(check_all(&c, &remote).is_err());
        assert!(remote.get_calls().is_empty());
    }

    #[test]
    fn local_entries_are_skipped() {
        let c = collection(
            r#"[{"title": "A", "files": ["a.pdf", {"archive-member": "b.pdf"}]}]"#,
        );
        let remote = MockRemote::new();

        assert!(check_all(&c, &remote).is_ok());
        assert!(remote.get_calls().is_empty());
    }

    #[test]
    fn error_message_lists_every_url() {
        let c = collection(
            r#"[{"title": "A", "files": [
                {"url": "https://example.com/one.mp4"},
                {"url": "https://example.com/two.mp4"}
            ]}]"#,
        );
        let err = check_all(&c, &MockRemote::new()).unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("Remote entries failed access test:"));
        assert!(message.contains("\n - HTTP 404: https://example.com/one.mp4"));
        assert!(message.contains("\n - HTTP 404: https://example.com/two.mp4"));
    }

    #[test]
    fn probes_follow_manifest_order() {
        let c = collection(
            r#"[
                {"title": "B", "files": [{"url": "https://example.com/2.mp4"}]},
                {"title": "A", "files": [{"url": "https://example.com/1.mp4"}]}
            ]"#,
        );
        let remote = MockRemote::new()
            .serving("https://example.com/1.mp4", b"")
            .serving("https://example.com/2.mp4", b"");
        check_all(&c, &remote).unwrap();

        assert_eq!(
            remote.get_calls(),
            vec![
                RecordedCall::Probe("https://example.com/2.mp4".into()),
                RecordedCall::Probe("https://example.com/1.mp4".into()),
            ]
        );
    }
}
