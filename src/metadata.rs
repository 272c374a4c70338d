//! Package-level metadata.
//!
//! Every package carries a small set of descriptive metadata entries
//! (name, title, descriptions, language, tags, creator, publisher, date and a
//! 48x48 PNG illustration). Descriptions have hard length ceilings which are
//! checked before any work starts, so an over-long `--description` fails the
//! run immediately instead of after a long download.

use chrono::NaiveDate;
use thiserror::Error;

/// Maximum length of the `Description` metadata, in characters.
pub const MAXIMUM_DESCRIPTION_LENGTH: usize = 80;
/// Maximum length of the `LongDescription` metadata, in characters.
pub const MAXIMUM_LONG_DESCRIPTION_LENGTH: usize = 4000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataLengthError {
    #[error("Description too long ({length}>{max})")]
    Description { length: usize, max: usize },
    #[error("LongDescription too long ({length}>{max})")]
    LongDescription { length: usize, max: usize },
}

/// Check description lengths and settle the long description.
///
/// A long description identical to the description carries no information
/// and is dropped.
pub fn compute_descriptions(
    description: &str,
    long_description: Option<&str>,
) -> Result<(String, Option<String>), MetadataLengthError> {
    let length = description.chars().count();
    if length > MAXIMUM_DESCRIPTION_LENGTH {
        return Err(MetadataLengthError::Description {
            length,
            max: MAXIMUM_DESCRIPTION_LENGTH,
        });
    }

    let long_description = match long_description.map(str::trim).filter(|l| !l.is_empty()) {
        Some(long) => {
            let length = long.chars().count();
            if length > MAXIMUM_LONG_DESCRIPTION_LENGTH {
                return Err(MetadataLengthError::LongDescription {
                    length,
                    max: MAXIMUM_LONG_DESCRIPTION_LENGTH,
                });
            }
            (long != description).then(|| long.to_string())
        }
        None => None,
    };

    Ok((description.to_string(), long_description))
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Metadata written into the package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    pub title: String,
    pub description: String,
    pub long_description: Option<String>,
    pub language: String,
    pub tags: Vec<String>,
    pub creator: String,
    pub publisher: String,
    pub date: NaiveDate,
    pub scraper: String,
    /// PNG bytes of the 48x48 illustration (the favicon).
    pub illustration: Vec<u8>,
}

impl PackageMetadata {
    /// Metadata as `(key, value)` pairs in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        let mut entries = vec![
            ("Name", self.name.clone().into_bytes()),
            ("Title", self.title.clone().into_bytes()),
            ("Description", self.description.clone().into_bytes()),
        ];
        if let Some(long) = &self.long_description {
            entries.push(("LongDescription", long.clone().into_bytes()));
        }
        entries.extend([
            ("Language", self.language.clone().into_bytes()),
            ("Tags", self.tags.join(";").into_bytes()),
            ("Creator", self.creator.clone().into_bytes()),
            ("Publisher", self.publisher.clone().into_bytes()),
            ("Date", self.date.format("%Y-%m-%d").to_string().into_bytes()),
            ("Scraper", self.scraper.clone().into_bytes()),
            ("Illustration_48x48@1", self.illustration.clone()),
        ]);
        entries
    }
}
