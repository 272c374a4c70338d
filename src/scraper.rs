//! Scraper orchestration.
//!
//! A run goes through these stages and stops at the first failure:
//!
//! ```text
//! 1. descriptions   length ceilings on description / long description
//! 2. archive        download (when a URL) and open the source archive
//! 3. collection     --collection file or URL, else collection.json in the archive
//! 4. reachability   every URL locator must answer with a 2xx status
//! 5. validation     missing, duplicate and non-URL files
//! 6. branding       images, colors, about page
//! 7. package        metadata, UI, then every collection file streamed in
//! ```
//!
//! The package file is only created once stage 5 has passed, and it is
//! removed again if anything fails while filling it. Intermediate files live
//! in `<output>/build`, removed at the end of the run unless asked to keep it.

use crate::archive::{
    ABOUT_MEMBER, ArchiveError, COLLECTION_MEMBER, SourceArchive, locate_archive,
};
use crate::branding::{Branding, BrandingError, BrandingInput, prepare_branding, resolve_about};
use crate::collection::{Collection, CollectionError, ResolvedFile, is_http_url};
use crate::generate::{
    self, DB_VERSION, GenerateError, HOME_PATH, HomePage, UiLabels, UiSettings,
};
use crate::http::{HttpClient, HttpError, RemoteSource};
use crate::imaging::{ImageBackend, RustBackend};
use crate::index::{build_index, render_database_js};
use crate::locale::resolve_locale;
use crate::metadata::{MetadataLengthError, PackageMetadata, compute_descriptions};
use crate::package::{PackageError, ZipPackage};
use crate::reachability::{RemoteAccessError, check_all};
use crate::stream::{StreamError, StreamEvent, StreamStats, Streamer};
use crate::validate::{ValidationError, validate};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Identity stamped into the `Scraper` metadata.
pub const SCRAPER: &str = env!("NAUTILUS_SCRAPER");

/// Intermediate files directory, under the output directory.
pub const BUILD_DIR: &str = "build";

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataLengthError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),
    #[error("Download failed: {0}")]
    Http(#[from] HttpError),
    #[error(transparent)]
    Reachability(#[from] RemoteAccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Branding error: {0}")]
    Branding(#[from] BrandingError),
    #[error("Package error: {0}")]
    Package(#[from] PackageError),
    #[error("UI generation error: {0}")]
    Generate(#[from] GenerateError),
    #[error("Streaming error: {0}")]
    Stream(#[from] StreamError),
    #[error("No collection: pass --collection or an archive containing collection.json")]
    NoCollection,
}

/// Fully resolved run options (config file merged with command-line flags).
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperOptions {
    pub name: String,
    pub title: String,
    pub description: String,
    pub long_description: Option<String>,
    /// Local path or URL of the source archive.
    pub archive: Option<String>,
    /// Local path or URL of the collection manifest.
    pub collection: Option<String>,
    pub branding: BrandingInput,
    pub language: String,
    pub locale: Option<String>,
    pub tags: Vec<String>,
    pub creator: String,
    pub publisher: String,
    pub pagination: u32,
    pub randomize: bool,
    pub show_description: bool,
    pub show_author: bool,
    pub download_delay: Duration,
    pub debug: bool,
    pub keep_build_dir: bool,
    pub output_dir: PathBuf,
    /// Package file name inside `output_dir`; `{name}_{period}.zim` when unset.
    pub zim_file: Option<String>,
}

impl ScraperOptions {
    /// Options with stock defaults for everything but the required values.
    pub fn new(name: &str, description: &str, output_dir: &Path) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            description: description.to_string(),
            long_description: None,
            archive: None,
            collection: None,
            branding: BrandingInput::default(),
            language: "eng".to_string(),
            locale: None,
            tags: Vec::new(),
            creator: "Unknown".to_string(),
            publisher: "openZIM".to_string(),
            pagination: 10,
            randomize: true,
            show_description: false,
            show_author: true,
            download_delay: Duration::ZERO,
            debug: false,
            keep_build_dir: false,
            output_dir: output_dir.to_path_buf(),
            zim_file: None,
        }
    }

    /// Package path for a given `YYYY-MM` period.
    pub fn zim_path(&self, period: &str) -> PathBuf {
        let fname = match &self.zim_file {
            Some(fname) => fname.clone(),
            None => format!("{}_{period}.zim", self.name),
        };
        self.output_dir.join(fname)
    }
}

/// Result of `check`: the collection passed every test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub items: usize,
    pub files: usize,
    pub remote: usize,
    pub local: usize,
}

impl CheckSummary {
    fn new(collection: &Collection, files: &[ResolvedFile]) -> Self {
        let remote = files.iter().filter(|f| f.is_remote()).count();
        Self {
            items: collection.item_count(),
            files: files.len(),
            remote,
            local: files.len() - remote,
        }
    }
}

/// Result of a successful `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub zim_path: PathBuf,
    pub items: usize,
    pub stats: StreamStats,
    /// Items written to the package, UI included, metadata excluded.
    pub package_items: usize,
}

/// Loaded and validated inputs shared by `check` and `run`.
struct Inputs {
    archive: Option<SourceArchive>,
    collection: Collection,
    files: Vec<ResolvedFile>,
}

pub struct Scraper<R: RemoteSource = HttpClient, B: ImageBackend = RustBackend> {
    options: ScraperOptions,
    remote: R,
    backend: B,
}

impl Scraper {
    /// Scraper using the network and the pure-Rust image backend.
    pub fn new(options: ScraperOptions) -> Result<Self, ScraperError> {
        Ok(Self::with_parts(options, HttpClient::new()?, RustBackend::new()))
    }
}

impl<R: RemoteSource, B: ImageBackend> Scraper<R, B> {
    pub fn with_parts(options: ScraperOptions, remote: R, backend: B) -> Self {
        Self {
            options,
            remote,
            backend,
        }
    }

    /// Load and test the collection without producing anything.
    pub fn check(&self) -> Result<CheckSummary, ScraperError> {
        compute_descriptions(
            &self.options.description,
            self.options.long_description.as_deref(),
        )?;
        let scratch = TempDir::new()?;
        let inputs = self.load_inputs(scratch.path(), scratch.path())?;
        Ok(CheckSummary::new(&inputs.collection, &inputs.files))
    }

    /// Build the package.
    pub fn run(&self, events: Option<Sender<StreamEvent>>) -> Result<RunSummary, ScraperError> {
        let opts = &self.options;
        info!("Starting scraper with {SCRAPER}");
        let (description, long_description) =
            compute_descriptions(&opts.description, opts.long_description.as_deref())?;

        let build_dir = opts.output_dir.join(BUILD_DIR);
        prepare_build_dir(&build_dir, opts.keep_build_dir)?;

        let result = self.run_in(&build_dir, &description, long_description.as_deref(), events);

        if opts.keep_build_dir {
            info!("Build dir kept at {}", build_dir.display());
        } else if let Err(e) = fs::remove_dir_all(&build_dir) {
            warn!("Could not remove build dir {}: {e}", build_dir.display());
        }
        result
    }

    fn run_in(
        &self,
        build_dir: &Path,
        description: &str,
        long_description: Option<&str>,
        events: Option<Sender<StreamEvent>>,
    ) -> Result<RunSummary, ScraperError> {
        let opts = &self.options;
        let today = Local::now().date_naive();
        let period = today.format("%Y-%m").to_string();

        let Inputs {
            mut archive,
            collection,
            files,
        } = self.load_inputs(&opts.output_dir, build_dir)?;

        let branding = prepare_branding(&opts.branding, build_dir, &self.backend, &self.remote)?;
        let archive_about = match archive.as_mut() {
            Some(archive) if branding.about_html.is_none() => read_archive_about(archive),
            _ => None,
        };
        let about_html = resolve_about(
            branding.about_html.as_deref(),
            archive_about.as_deref(),
            long_description,
            description,
        );

        let database_js = render_database_js(&build_index(&collection))?;
        let locale = resolve_locale(opts.locale.as_deref(), &opts.language);
        let settings = UiSettings {
            title: opts.title.clone(),
            description: description.to_string(),
            database_name: generate::database_name(&opts.name, &period, &database_js),
            database_version: DB_VERSION,
            nb_items_per_page: opts.pagination,
            show_author: opts.show_author,
            show_description: opts.show_description,
            randomize: opts.randomize,
            debug: opts.debug,
            i18n: UiLabels {
                loading: locale.labels.loading.to_string(),
                no_result: locale.labels.no_result.to_string(),
            },
        };
        let page = HomePage {
            title: &opts.title,
            description,
            main_color: branding.main_color,
            secondary_color: branding.secondary_color,
            has_main_logo: branding.main_logo.is_some(),
            has_secondary_logo: branding.secondary_logo.is_some(),
            about_html: &about_html,
            locale: &locale,
        };

        let metadata = self.metadata(&branding, description, long_description, today)?;
        let zim_path = opts.zim_path(&period);
        info!("Creating package at {}", zim_path.display());
        let mut package = ZipPackage::create(&zim_path, metadata, HOME_PATH)?;

        let filled = generate::add_ui(&mut package, &branding, &page, &settings, &database_js)
            .map_err(ScraperError::from)
            .and_then(|()| {
                Streamer::new(&self.remote, build_dir)
                    .with_archive(archive.as_mut())
                    .with_download_delay(opts.download_delay)
                    .with_events(events)
                    .stream_all(&files, &mut package)
                    .map_err(ScraperError::from)
            });
        let stats = match filled {
            Ok(stats) => stats,
            Err(e) => {
                drop(package);
                if let Err(rm) = fs::remove_file(&zim_path) {
                    warn!("Could not remove partial package {}: {rm}", zim_path.display());
                }
                return Err(e);
            }
        };

        let package_items = package.item_count();
        let zim_path = package.finish()?;
        info!("Package ready at {}", zim_path.display());

        Ok(RunSummary {
            zim_path,
            items: collection.item_count(),
            stats,
            package_items,
        })
    }

    fn metadata(
        &self,
        branding: &Branding,
        description: &str,
        long_description: Option<&str>,
        date: NaiveDate,
    ) -> Result<PackageMetadata, ScraperError> {
        let opts = &self.options;
        Ok(PackageMetadata {
            name: opts.name.clone(),
            title: opts.title.clone(),
            description: description.to_string(),
            long_description: long_description.map(str::to_string),
            language: opts.language.clone(),
            tags: opts.tags.clone(),
            creator: opts.creator.clone(),
            publisher: opts.publisher.clone(),
            date,
            scraper: SCRAPER.to_string(),
            illustration: fs::read(&branding.favicon)?,
        })
    }

    /// Stages 2 to 5: archive, collection, reachability, validation.
    ///
    /// A remote archive is downloaded into `download_dir`; a remote
    /// collection into `build_dir`.
    fn load_inputs(&self, download_dir: &Path, build_dir: &Path) -> Result<Inputs, ScraperError> {
        fs::create_dir_all(download_dir)?;
        let mut archive = self.open_archive(download_dir)?;
        let collection = self.load_collection(archive.as_mut(), build_dir)?;
        info!(
            "Collection loaded: {} items, {} files",
            collection.item_count(),
            collection.file_count()
        );

        info!("Checking remote entries");
        check_all(&collection, &self.remote)?;

        info!("Checking collection consistency");
        let members = archive.as_ref().map(SourceArchive::member_names);
        let files = validate(&collection, members.as_ref())?;

        Ok(Inputs {
            archive,
            collection,
            files,
        })
    }

    fn open_archive(&self, download_dir: &Path) -> Result<Option<SourceArchive>, ScraperError> {
        let Some(source) = self.options.archive.as_deref() else {
            return Ok(None);
        };
        let path = locate_archive(source, download_dir, &self.remote)?;
        debug!("Opening archive {}", path.display());
        Ok(Some(SourceArchive::open(&path)?))
    }

    fn load_collection(
        &self,
        archive: Option<&mut SourceArchive>,
        build_dir: &Path,
    ) -> Result<Collection, ScraperError> {
        match (self.options.collection.as_deref(), archive) {
            (Some(source), _) if is_http_url(source) => {
                fs::create_dir_all(build_dir)?;
                let dest = build_dir.join(COLLECTION_MEMBER);
                info!("Downloading collection at {source}");
                self.remote.download(source, &dest)?;
                Ok(Collection::load(&dest)?)
            }
            (Some(source), _) => Ok(Collection::load(Path::new(source))?),
            (None, Some(archive)) => {
                info!("Using {COLLECTION_MEMBER} from archive");
                let json = archive.read_to_string(COLLECTION_MEMBER)?;
                Ok(Collection::from_json(&json)?)
            }
            (None, None) => Err(ScraperError::NoCollection),
        }
    }
}

/// Start from an empty build dir, unless leftovers are to be kept.
fn prepare_build_dir(build_dir: &Path, keep: bool) -> std::io::Result<()> {
    if !keep && build_dir.exists() {
        debug!("Removing previous build dir {}", build_dir.display());
        fs::remove_dir_all(build_dir)?;
    }
    fs::create_dir_all(build_dir)
}

/// The archive's about page, if any. Unreadable content is ignored.
fn read_archive_about(archive: &mut SourceArchive) -> Option<String> {
    if !archive.contains(ABOUT_MEMBER) {
        return None;
    }
    match archive.read_to_string(ABOUT_MEMBER) {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Ignoring {ABOUT_MEMBER} from archive: {e}");
            None
        }
    }
}
