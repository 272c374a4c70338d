//! Client-side search index.
//!
//! One compact record per collection entry, serialized as a JavaScript array
//! literal (`database.js`). The shipped UI loads it and searches locally; no
//! server-side logic reads it.

use crate::collection::{Collection, normalized_path};
use serde::Serialize;

/// Script asset holding the index literal.
pub const DATABASE_ASSET: &str = "database.js";

/// Compact index record. Field names are short to keep the literal small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRecord {
    /// Zero-padded sequential id.
    #[serde(rename = "_id")]
    pub id: String,
    pub ti: String,
    pub dsc: String,
    pub aut: String,
    /// Target filenames, normalized like package paths.
    pub fp: Vec<String>,
}

/// Build one record per entry, in manifest order.
///
/// Malformed file references contribute no filename; validation has already
/// rejected such collections before a real run gets here.
pub fn build_index(collection: &Collection) -> Vec<IndexRecord> {
    collection
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| IndexRecord {
            id: format_id(position),
            ti: entry.display_title().to_string(),
            dsc: entry.description.clone().unwrap_or_default(),
            aut: entry.authors.clone().unwrap_or_default(),
            fp: entry
                .files
                .iter()
                .filter_map(|file| file.normalize().ok())
                .map(|resolved| normalized_path(&resolved.filename))
                .collect(),
        })
        .collect()
}

/// Five-digit id: 0 → "00000".
pub fn format_id(position: usize) -> String {
    format!("{:05}", position)
}

/// Render the `database.js` asset: one JSON record per line.
pub fn render_database_js(records: &[IndexRecord]) -> Result<String, serde_json::Error> {
    let mut js = String::from("var DATABASE = [\n");
    for record in records {
        js.push_str(&serde_json::to_string(record)?);
        js.push_str(",\n");
    }
    js.push_str("];\n");
    Ok(js)
}
