//! Branding assets: favicon, logos, colors and the about page.
//!
//! Colors are checked before any image is fetched. Images may be local paths
//! or URLs; they are staged in the build directory and resized to their box
//! with the [`ImageBackend`].
//!
//! ## Outputs (all in the build directory)
//!
//! | File | Size | Source |
//! |---|---|---|
//! | `favicon.png` | ≤ 48x48 | `--favicon`, or a solid placeholder |
//! | `favicon.ico` | same | always derived from `favicon.png` |
//! | `main-logo.png` | ≤ 300x65 | `--main-logo` only |
//! | `secondary-logo.png` | ≤ 300x65 | `--secondary-logo` only |

use crate::collection::is_http_url;
use crate::http::{HttpError, RemoteSource};
use crate::imaging::{BackendError, FitParams, IconParams, ImageBackend, PlaceholderParams, Rgb};
use maud::html;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Color used when neither a color nor a main logo is supplied.
pub const DEFAULT_COLOR: Rgb = Rgb::new(0x95, 0xa5, 0xa6);

pub const FAVICON_PNG: &str = "favicon.png";
pub const FAVICON_ICO: &str = "favicon.ico";
pub const MAIN_LOGO: &str = "main-logo.png";
pub const SECONDARY_LOGO: &str = "secondary-logo.png";

pub const FAVICON_BOX: (u32, u32) = (48, 48);
pub const LOGO_BOX: (u32, u32) = (300, 65);

#[derive(Error, Debug)]
pub enum BrandingError {
    #[error("{flag} is not a valid hex color: {value}")]
    InvalidColor { flag: &'static str, value: String },
    #[error("Unusable image {path}: {source}")]
    Image { path: String, source: BackendError },
    #[error("Failed to fetch {path}: {source}")]
    Fetch { path: String, source: HttpError },
    #[error("Failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

pub fn is_hex_color(value: &str) -> bool {
    Rgb::from_hex(value).is_some()
}

/// Branding values as supplied by the user (CLI or config).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandingInput {
    pub favicon: Option<String>,
    pub main_logo: Option<String>,
    pub secondary_logo: Option<String>,
    pub main_color: Option<String>,
    pub secondary_color: Option<String>,
    /// Custom about page: HTML file path or URL.
    pub about: Option<String>,
}

impl BrandingInput {
    /// True when the user supplied nothing to check.
    pub fn is_empty(&self) -> bool {
        [
            &self.favicon,
            &self.main_logo,
            &self.secondary_logo,
            &self.main_color,
            &self.secondary_color,
            &self.about,
        ]
        .iter()
        .all(|value| value.is_none())
    }
}

/// Prepared branding, ready to be added to the package.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub favicon: PathBuf,
    pub favicon_ico: PathBuf,
    pub main_logo: Option<PathBuf>,
    pub secondary_logo: Option<PathBuf>,
    pub main_color: Rgb,
    pub secondary_color: Rgb,
    /// Content of the custom about page, if one was supplied.
    pub about_html: Option<String>,
}

impl Branding {
    /// Image assets as `(package path, staged file)`, favicon first.
    pub fn assets(&self) -> Vec<(&'static str, &Path)> {
        let mut assets = vec![
            (FAVICON_ICO, self.favicon_ico.as_path()),
            (FAVICON_PNG, self.favicon.as_path()),
        ];
        if let Some(logo) = &self.main_logo {
            assets.push((MAIN_LOGO, logo.as_path()));
        }
        if let Some(logo) = &self.secondary_logo {
            assets.push((SECONDARY_LOGO, logo.as_path()));
        }
        assets
    }
}

/// Copy a local file or download a URL to `dest`.
pub fn fetch_user_file(
    source: &str,
    dest: &Path,
    remote: &impl RemoteSource,
) -> Result<(), BrandingError> {
    if is_http_url(source) {
        debug!("Downloading {source}");
        remote
            .download(source, dest)
            .map_err(|source_err| BrandingError::Fetch {
                path: source.to_string(),
                source: source_err,
            })?;
    } else {
        fs::copy(source, dest).map_err(|e| BrandingError::Io {
            path: source.to_string(),
            source: e,
        })?;
    }
    Ok(())
}

fn parse_color(flag: &'static str, value: Option<&str>) -> Result<Option<Rgb>, BrandingError> {
    value
        .map(|v| {
            Rgb::from_hex(v).ok_or_else(|| BrandingError::InvalidColor {
                flag,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// Fetch a user image and fit it into `max`, writing `build_dir/name`.
fn prepare_image(
    source: &str,
    name: &str,
    max: (u32, u32),
    build_dir: &Path,
    backend: &impl ImageBackend,
    remote: &impl RemoteSource,
) -> Result<PathBuf, BrandingError> {
    let staged = build_dir.join(format!("{name}.source"));
    let output = build_dir.join(name);
    fetch_user_file(source, &staged, remote)?;

    let fitted = backend.fit(&FitParams {
        source: staged.clone(),
        output: output.clone(),
        max_width: max.0,
        max_height: max.1,
    });
    // Staged original is no longer needed either way.
    let _ = fs::remove_file(&staged);
    let written = fitted.map_err(|e| BrandingError::Image {
        path: source.to_string(),
        source: e,
    })?;
    debug!("{name}: {}x{}", written.width, written.height);
    Ok(output)
}

/// Check user values and produce every branding asset in `build_dir`.
pub fn prepare_branding(
    input: &BrandingInput,
    build_dir: &Path,
    backend: &impl ImageBackend,
    remote: &impl RemoteSource,
) -> Result<Branding, BrandingError> {
    let main_color = parse_color("--main-color", input.main_color.as_deref())?;
    let secondary_color = parse_color("--secondary-color", input.secondary_color.as_deref())?;

    if !input.is_empty() {
        info!("Checking branding files and values");
    }

    let image = |source: &Option<String>, name: &str, max| {
        source
            .as_deref()
            .map(|src| prepare_image(src, name, max, build_dir, backend, remote))
            .transpose()
    };
    let favicon = image(&input.favicon, FAVICON_PNG, FAVICON_BOX)?;
    let main_logo = image(&input.main_logo, MAIN_LOGO, LOGO_BOX)?;
    let secondary_logo = image(&input.secondary_logo, SECONDARY_LOGO, LOGO_BOX)?;

    let image_error = |path: &Path, e: BackendError| BrandingError::Image {
        path: path.display().to_string(),
        source: e,
    };

    let favicon = match favicon {
        Some(path) => path,
        None => {
            let path = build_dir.join(FAVICON_PNG);
            backend
                .placeholder(&PlaceholderParams {
                    output: path.clone(),
                    width: FAVICON_BOX.0,
                    height: FAVICON_BOX.1,
                    color: DEFAULT_COLOR,
                })
                .map_err(|e| image_error(path.as_path(), e))?;
            path
        }
    };

    let favicon_ico = build_dir.join(FAVICON_ICO);
    backend
        .icon(&IconParams {
            source: favicon.clone(),
            output: favicon_ico.clone(),
        })
        .map_err(|e| image_error(favicon.as_path(), e))?;

    let logo_color = match &main_logo {
        Some(logo) => backend
            .dominant_color(logo)
            .map_err(|e| image_error(logo.as_path(), e))?,
        None => DEFAULT_COLOR,
    };

    let about_html = match &input.about {
        Some(source) => {
            let dest = build_dir.join("about.html");
            fetch_user_file(source, &dest, remote)?;
            let content = fs::read_to_string(&dest).map_err(|e| BrandingError::Io {
                path: source.clone(),
                source: e,
            })?;
            let _ = fs::remove_file(&dest);
            Some(content)
        }
        None => None,
    };

    Ok(Branding {
        favicon,
        favicon_ico,
        main_logo,
        secondary_logo,
        main_color: main_color.unwrap_or(logo_color),
        secondary_color: secondary_color.unwrap_or(logo_color),
        about_html,
    })
}

/// About page content: custom page, else the archive's, else the description.
pub fn resolve_about(
    custom: Option<&str>,
    from_archive: Option<&str>,
    long_description: Option<&str>,
    description: &str,
) -> String {
    custom
        .or(from_archive)
        .map(str::to_string)
        .unwrap_or_else(|| {
            html! { p { (long_description.unwrap_or(description)) } }.into_string()
        })
}
