//! Directory listing discovery.
//!
//! A listing is an HTML index page of the kind produced by common static file
//! servers: one `<a>` element per entry inside a `<pre>` block. The text of
//! each anchor is the entry's name.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument, trace};
use url::Url;

#[allow(clippy::expect_used)]
static PRE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b[^>]*>(.*?)</pre>").expect("pre block regex is valid")
});

#[allow(clippy::expect_used)]
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("anchor regex is valid")
});

#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

#[allow(clippy::expect_used)]
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos);")
        .expect("entity regex is valid")
});

/// Errors that can occur while fetching a directory listing.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The listing URL is malformed.
    #[error("invalid listing URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error while requesting or reading the page.
    #[error("network error fetching listing {url}: {source}")]
    Network {
        /// The listing URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching listing {url}")]
    HttpStatus {
        /// The listing URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl ListingError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }
}

/// Fetches the listing page at `url` and returns the filenames it names.
///
/// # Errors
///
/// Returns [`ListingError`] if the page cannot be fetched or the server
/// answers with a non-success status. An empty page is not an error.
#[instrument(skip(client), fields(url = %url))]
pub async fn fetch_listing(client: &Client, url: &Url) -> Result<Vec<String>, ListingError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ListingError::network(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ListingError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| ListingError::network(url.as_str(), e))?;
    debug!(bytes = html.len(), "fetched listing page");

    Ok(parse_listing(&html))
}

/// Extracts filenames from a listing page, in page order.
///
/// Only anchors inside `<pre>` blocks are considered. Subdirectories (names
/// ending in `/`), parent links and names that are not a single path segment
/// are skipped; a name listed twice is kept once.
///
/// # Examples
///
/// ```
/// use earliest_core::parse_listing;
///
/// let html = r#"<pre><a href="a.txt">a.txt</a>
/// <a href="sub/">sub/</a>
/// <a href="b%26c.txt">b&amp;c.txt</a></pre>"#;
/// assert_eq!(parse_listing(html), vec!["a.txt", "b&c.txt"]);
/// ```
#[must_use]
pub fn parse_listing(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for block in PRE_BLOCK_RE.captures_iter(html) {
        for anchor in ANCHOR_RE.captures_iter(&block[1]) {
            let text = TAG_RE.replace_all(&anchor[1], "");
            let name = decode_entities(text.trim());

            if !is_plain_filename(&name) {
                trace!(entry = %name, "skipping listing entry");
                continue;
            }
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }

    names
}

pub(crate) fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => numeric_entity(entity),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
