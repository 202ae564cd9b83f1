//! Candidate URL preparation for the source list.
//!
//! Used by the `seed_urls` CLI before anything is pushed.

use thiserror::Error;
use url::Url;

/// Search endpoint concept queries are expanded against.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

/// Query suffixes a concept is expanded into.
const CONCEPT_SUFFIXES: [&str; 3] = ["trading", "pinescript", "pdf"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("not a valid URL: {0}")]
    Malformed(String),

    #[error("unsupported scheme {scheme:?} (only http and https)")]
    UnsupportedScheme { scheme: String },

    #[error("concept must not be empty")]
    EmptyConcept,
}

/// Check that `raw` is an absolute http(s) URL.
///
/// The input text is kept as-is on success so the crawler sees exactly what
/// the operator provided.
pub fn validate_url(raw: &str) -> Result<String, SeedError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| SeedError::Malformed(trimmed.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(SeedError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

/// Search queries derived from a concept: `<concept> trading`,
/// `<concept> pinescript`, `<concept> pdf`.
pub fn concept_queries(concept: &str) -> Result<Vec<String>, SeedError> {
    let concept = concept.trim();
    if concept.is_empty() {
        return Err(SeedError::EmptyConcept);
    }

    Ok(CONCEPT_SUFFIXES
        .iter()
        .map(|suffix| format!("{} {}", concept, suffix))
        .collect())
}

/// Search URLs for every concept query, with the query form-encoded as `q`.
pub fn concept_urls(concept: &str, search_url: &str) -> Result<Vec<String>, SeedError> {
    let base = validate_url(search_url)?;

    concept_queries(concept)?
        .into_iter()
        .map(|query| {
            Url::parse_with_params(&base, &[("q", query.as_str())])
                .map(|url| url.to_string())
                .map_err(|_| SeedError::Malformed(base.clone()))
        })
        .collect()
}

/// Split raw lines into valid URLs and rejected entries, skipping blanks and
/// `#` comments.
pub fn partition_lines<'a, I>(lines: I) -> (Vec<String>, Vec<(String, SeedError)>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match validate_url(line) {
            Ok(url) => accepted.push(url),
            Err(e) => rejected.push((line.to_string(), e)),
        }
    }

    (accepted, rejected)
}
