// Manifest parsing: turns playlist text into an ordered list of absolute segment URLs.

use tracing::trace;
use url::Url;

/// Lines starting with this marker are comments or directives and are skipped.
pub const COMMENT_MARKER: char = '#';

/// A resolved segment location. `index` is its position in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub index: usize,
    pub url: Url,
}

/// A parsed manifest: its own location plus the segments in playback order.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub source: Url,
    pub segments: Vec<SegmentRef>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("line {line}: cannot resolve segment locator '{locator}': {reason}")]
    InvalidLocator {
        line: usize,
        locator: String,
        reason: String,
    },
}

/// Resolves segment locators against the directory containing the manifest.
#[derive(Debug, Clone)]
pub struct ManifestParser {
    base: String,
}

impl ManifestParser {
    pub fn new(manifest_url: &Url) -> Self {
        Self {
            base: containing_directory(manifest_url),
        }
    }

    /// The manifest location up to and including its final `/`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve one locator. Absolute URLs pass through, anything else is
    /// appended to the manifest directory.
    pub fn resolve(&self, locator: &str) -> Result<Url, url::ParseError> {
        if let Some(absolute) = as_absolute(locator) {
            return Ok(absolute);
        }
        Url::parse(&format!("{}{locator}", self.base))
    }

    pub fn parse(&self, text: &str) -> Result<Vec<SegmentRef>, ManifestError> {
        let mut segments = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim_start_matches('\u{feff}').trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            let url = self
                .resolve(line)
                .map_err(|e| ManifestError::InvalidLocator {
                    line: line_no + 1,
                    locator: line.to_string(),
                    reason: e.to_string(),
                })?;
            trace!(index = segments.len(), %url, "Resolved segment");
            segments.push(SegmentRef {
                index: segments.len(),
                url,
            });
        }

        Ok(segments)
    }
}

/// Parse manifest text fetched from `source`.
///
/// A manifest without segment lines parses successfully to an empty
/// [`Manifest`]; rejecting it is up to the caller.
pub fn parse_manifest(text: &str, source: &Url) -> Result<Manifest, ManifestError> {
    let segments = ManifestParser::new(source).parse(text)?;
    Ok(Manifest {
        source: source.clone(),
        segments,
    })
}

fn containing_directory(url: &Url) -> String {
    let mut dir = url.clone();
    dir.set_query(None);
    dir.set_fragment(None);
    let serialized = dir.as_str();
    match serialized.rfind('/') {
        Some(pos) => serialized[..=pos].to_string(),
        None => format!("{serialized}/"),
    }
}

// `seg:1.ts` parses as a URL with scheme `seg`, so require a hierarchical URL.
fn as_absolute(locator: &str) -> Option<Url> {
    Url::parse(locator).ok().filter(|url| !url.cannot_be_a_base())
}
