//! Client UI generation.
//!
//! Builds the browsing shell shipped inside every package and adds it to the
//! [`PackageWriter`]. The UI is fully static: the home page loads the index
//! literal and a small script that searches and paginates in the browser.
//!
//! ## Generated Items
//!
//! ```text
//! home                   # main page: header, search, list, about, footer
//! init.js                # UI settings, starts the client
//! database.js            # `var DATABASE = [...]` index literal
//! assets/nautilus.js     # client (static)
//! assets/style.css       # base styles (static)
//! favicon.ico            # branding images
//! favicon.png
//! main-logo.png          # when supplied
//! secondary-logo.png     # when supplied
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. The about
//! section is the one place where raw HTML is inserted on purpose.

use crate::branding::{Branding, FAVICON_ICO, FAVICON_PNG, MAIN_LOGO, SECONDARY_LOGO};
use crate::imaging::Rgb;
use crate::index::DATABASE_ASSET;
use crate::locale::Locale;
use crate::package::{PackageError, PackageWriter};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Main page path.
pub const HOME_PATH: &str = "home";
pub const INIT_JS: &str = "init.js";
pub const CLIENT_JS: &str = "assets/nautilus.js";
pub const STYLE_CSS: &str = "assets/style.css";

/// Version of the client-side database layout.
pub const DB_VERSION: u32 = 1;

const CLIENT_JS_STATIC: &str = include_str!("../static/nautilus.js");
const CSS_STATIC: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Package error: {0}")]
    Package(#[from] PackageError),
}

/// Client-side database name: stable for identical content.
///
/// Readers cache the database by name, so a rebuilt package with a different
/// index must not reuse the name of an older one.
pub fn database_name(name: &str, period: &str, database_js: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(database_js.as_bytes()));
    format!("{name}_{period}_{}_db", &digest[..16])
}

/// Settings passed to the client by `init.js`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiSettings {
    pub title: String,
    pub description: String,
    pub database_name: String,
    pub database_version: u32,
    pub nb_items_per_page: u32,
    pub show_author: bool,
    pub show_description: bool,
    pub randomize: bool,
    pub debug: bool,
    pub i18n: UiLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiLabels {
    pub loading: String,
    pub no_result: String,
}

/// Content of the home page.
#[derive(Debug, Clone)]
pub struct HomePage<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub main_color: Rgb,
    pub secondary_color: Rgb,
    pub has_main_logo: bool,
    pub has_secondary_logo: bool,
    pub about_html: &'a str,
    pub locale: &'a Locale,
}

/// Generate CSS custom properties from branding colors.
pub fn generate_color_css(main: Rgb, secondary: Rgb) -> String {
    format!(
        r#":root {{
    --main-color: {main};
    --secondary-color: {secondary};
}}"#
    )
}

/// Render `init.js`: the settings object and the client bootstrap.
pub fn render_init_js(settings: &UiSettings) -> Result<String, serde_json::Error> {
    let options = serde_json::to_string_pretty(settings)?;
    Ok(format!(
        "document.addEventListener(\"DOMContentLoaded\", function () {{\n    \
         window.nautilus = new Nautilus({options});\n    \
         window.nautilus.start();\n}});\n"
    ))
}

// ============================================================================
// HTML Components
// ============================================================================

fn site_header(page: &HomePage) -> Markup {
    let labels = &page.locale.labels;
    html! {
        header.site-header {
            div.site-title {
                @if page.has_main_logo {
                    img src=(MAIN_LOGO) alt=(page.title);
                } @else {
                    h1 { (page.title) }
                }
                p.site-description { (page.description) }
            }
            form #search-form role="search" {
                input #search-input type="search" placeholder=(labels.search_input)
                    aria-label=(labels.search);
                button type="submit" { (labels.search) }
            }
        }
    }
}

fn site_footer(page: &HomePage) -> Markup {
    html! {
        footer.site-footer {
            a href="#" { (page.locale.labels.back_to_top) }
            @if page.has_secondary_logo {
                img src=(SECONDARY_LOGO) alt="";
            }
        }
    }
}

/// Renders the home page.
pub fn render_home(page: &HomePage) -> Markup {
    let labels = &page.locale.labels;
    let css = generate_color_css(page.main_color, page.secondary_color);

    html! {
        (DOCTYPE)
        html lang=(page.locale.code) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                link rel="icon" type="image/png" href=(FAVICON_PNG);
                link rel="shortcut icon" href=(FAVICON_ICO);
                link rel="stylesheet" href=(STYLE_CSS);
                style { (PreEscaped(css)) }
            }
            body {
                (site_header(page))
                main {
                    ul #doc-list {}
                    p #no-result hidden { (labels.no_result) }
                    nav #pagination {}
                    details #about {
                        summary { (labels.about) }
                        div.about-content { (PreEscaped(page.about_html)) }
                    }
                }
                (site_footer(page))
                script src=(DATABASE_ASSET) {}
                script src=(CLIENT_JS) {}
                script src=(INIT_JS) {}
            }
        }
    }
}

/// Add every UI item to the package.
pub fn add_ui(
    sink: &mut dyn PackageWriter,
    branding: &Branding,
    page: &HomePage,
    settings: &UiSettings,
    database_js: &str,
) -> Result<(), GenerateError> {
    for (path, fpath) in branding.assets() {
        sink.add_file(path, fpath, false)?;
    }

    sink.add_content(HOME_PATH, render_home(page).into_string().as_bytes(), "text/html")?;
    sink.add_content(INIT_JS, render_init_js(settings)?.as_bytes(), "text/javascript")?;
    sink.add_content(DATABASE_ASSET, database_js.as_bytes(), "text/javascript")?;
    sink.add_content(CLIENT_JS, CLIENT_JS_STATIC.as_bytes(), "text/javascript")?;
    sink.add_content(STYLE_CSS, CSS_STATIC.as_bytes(), "text/css")?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
