//! Materialize every resolved file into the package.
//!
//! Runs only after reachability and validation passed. Each file is staged in
//! the build directory (downloaded for URLs, extracted for archive members),
//! handed to the [`PackageWriter`] with a delete-after-ingest instruction, and
//! so never outlives its own iteration.
//!
//! Files are processed one at a time, in manifest order.

use crate::archive::{ArchiveError, SourceArchive};
use crate::collection::ResolvedFile;
use crate::http::{HttpError, RemoteSource};
use crate::package::{PackageError, PackageWriter};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Download failed: {0}")]
    Download(#[from] HttpError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Package error: {0}")]
    Package(#[from] PackageError),
    #[error("No archive to extract {0} from")]
    NoArchive(String),
}

/// Progress reported while streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Started { total: usize },
    FileAdded {
        /// 1-based position.
        index: usize,
        total: usize,
        uri: String,
        package_path: String,
        remote: bool,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub downloaded: usize,
    pub extracted: usize,
}

impl StreamStats {
    pub fn total(&self) -> usize {
        self.downloaded + self.extracted
    }
}

pub struct Streamer<'a, R: RemoteSource> {
    remote: &'a R,
    archive: Option<&'a mut SourceArchive>,
    build_dir: &'a Path,
    download_delay: Duration,
    events: Option<Sender<StreamEvent>>,
}

impl<'a, R: RemoteSource> Streamer<'a, R> {
    pub fn new(remote: &'a R, build_dir: &'a Path) -> Self {
        Self {
            remote,
            archive: None,
            build_dir,
            download_delay: Duration::ZERO,
            events: None,
        }
    }

    pub fn with_archive(mut self, archive: Option<&'a mut SourceArchive>) -> Self {
        self.archive = archive;
        self
    }

    /// Pause between two consecutive downloads.
    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn with_events(mut self, events: Option<Sender<StreamEvent>>) -> Self {
        self.events = events;
        self
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    /// Stream every file into `sink`, in order.
    pub fn stream_all(
        &mut self,
        files: &[ResolvedFile],
        sink: &mut dyn PackageWriter,
    ) -> Result<StreamStats, StreamError> {
        let total = files.len();
        let mut stats = StreamStats::default();
        self.emit(StreamEvent::Started { total });

        for (position, file) in files.iter().enumerate() {
            let package_path = file.package_path();
            let remote = file.is_remote();

            if remote {
                if stats.downloaded > 0 && !self.download_delay.is_zero() {
                    thread::sleep(self.download_delay);
                }
                self.stream_remote(file, &package_path, sink)?;
                stats.downloaded += 1;
            } else {
                self.stream_member(file, &package_path, sink)?;
                stats.extracted += 1;
            }

            self.emit(StreamEvent::FileAdded {
                index: position + 1,
                total,
                uri: file.uri.clone(),
                package_path,
                remote,
            });
        }

        Ok(stats)
    }

    fn stream_remote(
        &self,
        file: &ResolvedFile,
        package_path: &str,
        sink: &mut dyn PackageWriter,
    ) -> Result<(), StreamError> {
        debug!("Downloading {} into {}", file.uri, package_path);
        // Removed on drop if anything below fails before ingestion.
        let staged = NamedTempFile::new_in(self.build_dir)?.into_temp_path();
        self.remote.download(&file.uri, &staged)?;
        sink.add_file(package_path, &staged, true)?;
        Ok(())
    }

    fn stream_member(
        &mut self,
        file: &ResolvedFile,
        package_path: &str,
        sink: &mut dyn PackageWriter,
    ) -> Result<(), StreamError> {
        let archive = self
            .archive
            .as_deref_mut()
            .ok_or_else(|| StreamError::NoArchive(file.uri.clone()))?;
        debug!("Extracting {} into {}", file.uri, package_path);
        let staged = archive.extract(&file.uri, self.build_dir)?;
        sink.add_file(package_path, &staged, true)?;
        Ok(())
    }
}
