//! HTTP access to remote collection files.
//!
//! The [`RemoteSource`] trait is the seam between the pipeline and the network:
//! the reachability checker only *probes* URLs, the streamer *downloads* them.
//! [`HttpClient`] is the production implementation on top of a blocking
//! `reqwest` client. The pipeline is strictly sequential, so there is no async
//! runtime anywhere in the crate.

use reqwest::blocking::Client;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Why a URL did not pass a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No response at all (DNS, TLS, refused connection, invalid URL...).
    Connection(String),
    /// A response arrived with a non-2xx status.
    Status(u16),
}

/// Network access used by the pipeline.
pub trait RemoteSource {
    /// Issue a GET and report whether a successful status came back.
    ///
    /// The body is not read: this is a reachability check, not a download.
    fn probe(&self, url: &str) -> Result<(), ProbeFailure>;

    /// Stream the body of `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, HttpError>;
}

/// Blocking `reqwest` client.
///
/// No timeout is configured beyond the client defaults.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(concat!("nautilus-zim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl RemoteSource for HttpClient {
    fn probe(&self, url: &str) -> Result<(), ProbeFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProbeFailure::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeFailure::Status(status.as_u16()))
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        let mut response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut writer = BufWriter::new(File::create(dest)?);
        let written = response.copy_to(&mut writer)?;
        writer.flush()?;
        Ok(written)
    }
}
