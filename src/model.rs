use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Registry detection only looks for this marker in the first path segment.
const HOST_MARKER: &str = ".io";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageParseError {
    #[error("image reference '{0}' has no tag")]
    MissingTag(String),
}

/// A container image reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub host: String,
    pub repository: String,
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    /// Splits `[host/]repository:tag`.
    ///
    /// The tag follows the last `:`. The first path segment counts as a host
    /// only when it contains `.io` and more segments follow it.
    pub fn parse(raw: &str) -> Result<Self, ImageParseError> {
        let (path, tag) =
            raw.rsplit_once(':').ok_or_else(|| ImageParseError::MissingTag(raw.to_string()))?;

        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let (host, repository) = match path.split_once('/') {
            Some((first, rest)) if first.contains(HOST_MARKER) => (first.to_string(), rest),
            _ => (String::new(), path),
        };

        Ok(ImageRef { host, repository: repository.to_string(), name, tag: tag.to_string() })
    }

    pub fn has_host(&self) -> bool {
        !self.host.is_empty()
    }
}

impl FromStr for ImageRef {
    type Err = ImageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageRef::parse(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_host() {
            write!(f, "{}/", self.host)?;
        }
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Keeps the first occurrence of each image, comparing case-insensitively.
pub fn dedupe_images(images: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    images.into_iter().filter(|image| seen.insert(image.to_lowercase())).collect()
}

/// Outcome of scanning one directory tree.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub images: Vec<ImageRef>,
    pub files: usize,
    pub documents: usize,
    pub skipped_documents: usize,
    pub invalid_images: usize,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
