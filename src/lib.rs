//! # Nautilus ZIM
//!
//! Turns a collection of documents (audio, video, PDFs, anything) described
//! by a JSON manifest into a single browsable offline package.
//!
//! Files come from two places: members of a source zip archive, or remote
//! URLs. The package bundles every file under `files/`, a searchable index of
//! the collection, and a small static UI to browse it.
//!
//! # Architecture: Validate, Then Stream
//!
//! ```text
//! 1. Load      archive + collection.json   →  Collection
//! 2. Check     every URL answers 2xx         (RemoteAccessError otherwise)
//! 3. Validate  missing / duplicate files     →  Vec<ResolvedFile>
//! 4. Package   UI + index + each file        →  <name>_<YYYY-MM>.zim
//! ```
//!
//! Stages 1 to 3 never write to the package. A collection that fails any of
//! them produces no output at all, and every failure lists every offending
//! entry so a broken manifest is fixed in one pass.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collection`] | Manifest model and the file-entry normalizer |
//! | [`reachability`] | Probes every URL locator before anything is written |
//! | [`validate`] | Missing, duplicate and non-URL file detection |
//! | [`stream`] | Downloads or extracts each file into the package |
//! | [`index`] | The `database.js` index literal used by the UI |
//! | [`archive`] | Source zip archive: listing, reading, extraction |
//! | [`branding`] | Favicon, logos, colors and the about page |
//! | [`imaging`] | Pure-Rust image operations behind a backend trait |
//! | [`package`] | Package writer trait and the zip container |
//! | [`metadata`] | Package metadata and description length ceilings |
//! | [`generate`] | Home page, `init.js` and static assets, via Maud |
//! | [`locale`] | UI label translations |
//! | [`http`] | Remote access trait and the blocking HTTP client |
//! | [`config`] | `nautilus.toml` loading, merging and validation |
//! | [`scraper`] | Orchestrates a run from options to package |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sequential by Construction
//!
//! Downloads happen one at a time, optionally spaced by a delay, using a
//! blocking HTTP client. There is no async runtime. The only extra thread is
//! the CLI's progress printer.
//!
//! ## Seams for Testing
//!
//! Network access ([`http::RemoteSource`]), image processing
//! ([`imaging::ImageBackend`]) and package output ([`package::PackageWriter`])
//! are traits. Unit tests swap in in-memory implementations; integration
//! tests run the real zip writer against a local HTTP mock server.

pub mod archive;
pub mod branding;
pub mod collection;
pub mod config;
pub mod generate;
pub mod http;
pub mod imaging;
pub mod index;
pub mod locale;
pub mod metadata;
pub mod output;
pub mod package;
pub mod reachability;
pub mod scraper;
pub mod stream;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
