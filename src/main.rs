use clap::{Parser, Subcommand};
use nautilus_zim::config::{self, ScraperConfig};
use nautilus_zim::metadata::parse_tags;
use nautilus_zim::output;
use nautilus_zim::scraper::{Scraper, ScraperOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "nautilus-zim")]
#[command(about = "Turns a collection of documents into a browsable offline package")]
#[command(long_about = "\
Turns a collection of documents into a browsable offline package

A JSON manifest lists the items of the collection. Each item has a title,
optional description and authors, and one or more files. Files are members
of a source zip archive or remote URLs.

Manifest (collection.json):

  [
    {
      \"title\": \"Intro\",
      \"description\": \"Welcome video\",
      \"authors\": \"Ann\",
      \"files\": [
        \"intro.mp4\",                                         # archive member
        {\"archive-member\": \"raw/02.pdf\", \"filename\": \"guide.pdf\"},
        {\"url\": \"https://example.com/audio.mp3\"}
      ]
    }
  ]

Without --collection, collection.json is read from the archive. Without an
archive, every file must be a URL.

Every URL is checked and every file accounted for before anything is
written: a broken collection produces no package.

Run 'nautilus-zim gen-config' to generate a documented nautilus.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Verbose logging; also enables debug output in the generated UI
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: nautilus.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check, then build the package
    Build(BuildArgs),
    /// Load the collection and run every check without building
    Check(SourceArgs),
    /// Print a stock nautilus.toml with all options documented
    GenConfig,
}

/// Where the collection comes from. At least one is required.
#[derive(clap::Args, Clone)]
#[group(required = true, multiple = true)]
struct SourceArgs {
    /// Path or URL of a zip archive holding the files
    #[arg(long)]
    archive: Option<String>,

    /// Path or URL of the collection JSON (default: collection.json in the archive)
    #[arg(long)]
    collection: Option<String>,
}

#[derive(clap::Args, Clone)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Package name, used in the file name
    #[arg(long)]
    name: String,

    /// Package title (default: name)
    #[arg(long)]
    title: Option<String>,

    /// Short description, at most 80 characters
    #[arg(long)]
    description: String,

    /// Long description, at most 4000 characters
    #[arg(long = "longdescription")]
    long_description: Option<String>,

    /// Name of the content creator
    #[arg(long)]
    creator: Option<String>,

    /// Package publisher
    #[arg(long)]
    publisher: Option<String>,

    /// Path or URL of a custom about page (HTML)
    #[arg(long)]
    about: Option<String>,

    /// Path or URL of the favicon, resized to 48x48
    #[arg(long)]
    favicon: Option<String>,

    /// Path or URL of the header logo, resized to fit 300x65
    #[arg(long)]
    main_logo: Option<String>,

    /// Path or URL of the footer logo, resized to fit 300x65
    #[arg(long)]
    secondary_logo: Option<String>,

    /// Header color (#RRGGBB)
    #[arg(long)]
    main_color: Option<String>,

    /// Secondary color (#RRGGBB)
    #[arg(long)]
    secondary_color: Option<String>,

    /// ISO-639-3 content language(s), comma-separated
    #[arg(long)]
    language: Option<String>,

    /// UI locale (default: derived from the first language)
    #[arg(long)]
    locale: Option<String>,

    /// Comma-separated package tags
    #[arg(long)]
    tags: Option<String>,

    /// Items per page in the UI
    #[arg(long)]
    pagination: Option<u32>,

    /// Keep the manifest order instead of shuffling items
    #[arg(long)]
    no_random: bool,

    /// Show item descriptions in the list
    #[arg(long)]
    show_description: bool,

    /// Seconds to wait between two downloads
    #[arg(long)]
    download_delay: Option<f64>,

    /// Keep the build directory after the run
    #[arg(long)]
    keep: bool,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Package file name (default: <name>_<YYYY-MM>.zim)
    #[arg(long)]
    zim_file: Option<String>,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for line in output::format_failure(err.as_ref(), cli.debug) {
                tracing::error!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Build(args) => {
            let config = config::load_config(cli.config.as_deref(), &std::env::current_dir()?)?;
            let options = build_options(args.clone(), config, cli.debug)?;
            let output_dir = options.output_dir.clone();
            let scraper = Scraper::new(options)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_stream_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = scraper.run(Some(tx));
            if printer.join().is_err() {
                warn!("Progress printer stopped unexpectedly");
            }
            let summary = result?;
            output::print_run_summary(&summary);
            println!("==> Build complete: {}", output_dir.display());
        }
        Command::Check(source) => {
            // Loaded only to report config errors.
            config::load_config(cli.config.as_deref(), &std::env::current_dir()?)?;
            let mut options = ScraperOptions::new("check", "", &std::env::temp_dir());
            options.archive = source.archive.clone();
            options.collection = source.collection.clone();
            let summary = Scraper::new(options)?.check()?;
            output::print_check_summary(&summary);
            println!("==> Collection is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Apply command-line flags over the loaded config and resolve run options.
///
/// Flags win over config values; the result is validated again so bad flag
/// values are reported the same way as bad config values.
fn build_options(
    args: BuildArgs,
    mut config: ScraperConfig,
    debug: bool,
) -> Result<ScraperOptions, config::ConfigError> {
    if let Some(language) = args.language {
        config.language = language;
    }
    if args.locale.is_some() {
        config.locale = args.locale;
    }
    if let Some(tags) = args.tags {
        config.tags = parse_tags(&tags);
    }
    if let Some(creator) = args.creator {
        config.creator = creator;
    }
    if let Some(publisher) = args.publisher {
        config.publisher = publisher;
    }
    if let Some(pagination) = args.pagination {
        config.ui.pagination = pagination;
    }
    if args.no_random {
        config.ui.randomize = false;
    }
    if args.show_description {
        config.ui.show_description = true;
    }
    if let Some(delay) = args.download_delay {
        config.download.delay_secs = delay;
    }
    let branding = &mut config.branding;
    branding.favicon = args.favicon.or(branding.favicon.take());
    branding.main_logo = args.main_logo.or(branding.main_logo.take());
    branding.secondary_logo = args.secondary_logo.or(branding.secondary_logo.take());
    branding.main_color = args.main_color.or(branding.main_color.take());
    branding.secondary_color = args.secondary_color.or(branding.secondary_color.take());
    branding.about = args.about.or(branding.about.take());
    config.validate()?;

    let mut options = ScraperOptions::new(&args.name, &args.description, &args.output);
    options.title = args.title.unwrap_or_else(|| args.name.clone());
    options.long_description = args.long_description;
    options.archive = args.source.archive;
    options.collection = args.source.collection;
    options.branding = config.branding.into();
    options.language = config.language;
    options.locale = config.locale;
    options.tags = config.tags;
    options.creator = config.creator;
    options.publisher = config.publisher;
    options.pagination = config.ui.pagination;
    options.randomize = config.ui.randomize;
    options.show_description = config.ui.show_description;
    options.show_author = config.ui.show_author;
    options.download_delay = Duration::from_secs_f64(config.download.delay_secs);
    options.debug = debug;
    options.keep_build_dir = args.keep;
    options.zim_file = args.zim_file;
    Ok(options)
}
