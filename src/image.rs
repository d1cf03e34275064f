//! Base image references and the trusted-image table

use log::debug;
use std::collections::{HashMap, HashSet};

/// Tag recorded for trusted entries that name no tag
pub const WILDCARD_TAG: &str = "*";

/// The image named by a FROM instruction, split into name and tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImageReference {
    /// Reference as written (e.g., "python:3.11")
    pub raw: String,

    /// Everything before the last `:`
    pub image_name: String,

    /// Everything after the last `:`, if there is one
    pub tag: Option<String>,
}

impl BaseImageReference {
    /// Split a bare reference on its last `:`
    pub fn parse(raw: &str) -> Self {
        let (image_name, tag) = match raw.rsplit_once(':') {
            Some((name, tag)) => (name.to_string(), Some(tag.to_string())),
            None => (raw.to_string(), None),
        };
        Self {
            raw: raw.to_string(),
            image_name,
            tag,
        }
    }

    /// Extract the reference from a FROM argument string.
    ///
    /// Leading `--flag` options are skipped and a trailing `AS <stage>` is
    /// ignored. Returns `None` when no image token is present.
    pub fn from_instruction_value(value: &str) -> Option<Self> {
        value
            .split_whitespace()
            .find(|token| !token.starts_with("--"))
            .map(Self::parse)
    }

    pub fn has_tag(&self) -> bool {
        self.tag.is_some()
    }
}

/// Trusted image names mapped to the tags trusted for each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustConfig {
    image_tags: HashMap<String, HashSet<String>>,
}

impl TrustConfig {
    /// Build the table from `name` / `name:tag` entries
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut image_tags: HashMap<String, HashSet<String>> = HashMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (image, tag) = match entry.rsplit_once(':') {
                Some((image, tag)) => (image, tag),
                None => (entry, WILDCARD_TAG),
            };
            image_tags
                .entry(image.to_string())
                .or_default()
                .insert(tag.to_string());
        }
        debug!("trusting {} base images", image_tags.len());
        Self { image_tags }
    }

    /// A bare-name entry trusts every tag; a `name:tag` entry only that tag
    pub fn is_trusted(&self, image: &BaseImageReference) -> bool {
        let Some(tags) = self.image_tags.get(&image.image_name) else {
            return false;
        };
        if tags.contains(WILDCARD_TAG) {
            return true;
        }
        image.tag.as_ref().is_some_and(|tag| tags.contains(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.image_tags.is_empty()
    }
}
