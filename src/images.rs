//! Pinned-image extraction for release and security auditing
//!
//! Produces the de-duplicated, sorted list of container images the deployment
//! pins. The primary strategy reads declared configuration defaults
//! ([`pinned_images`]); operational metadata should always come from declared
//! configuration. A legacy fallback ([`scan_source_text`]) pattern-matches
//! assignment statements in source text; it depends on exact formatting and
//! breaks silently when the assignment is refactored, so it exists only for
//! auditing trees that predate declared image options.
//!
//! An empty result is a hard error, never an empty list: a release audit that
//! finds no pinned images means the extraction is broken, not that the
//! deployment ships no images.

use std::collections::BTreeSet;

use crate::config::CharmConfig;
use crate::error::Error;
use crate::Result;

/// Extract pinned images from declared configuration defaults
///
/// Every option whose name ends in `-image` contributes its default value.
pub fn pinned_images(config: &CharmConfig) -> Result<Vec<String>> {
    let mut images = BTreeSet::new();
    for name in config.options.keys() {
        if !name.ends_with("-image") {
            continue;
        }
        if let Some(image) = config.default_for(name) {
            images.insert(image);
        }
    }
    if images.is_empty() {
        return Err(Error::NoImages(
            "no declared image defaults in config".to_string(),
        ));
    }
    Ok(images.into_iter().collect())
}

/// Legacy fallback: scan source text for pinned-image assignment statements
///
/// Matches lines of the form `SOMETHING_IMAGE = "repo/name:tag"`. Returns a
/// de-duplicated, sorted list; empty when nothing matches (callers decide
/// whether that is fatal, [`pinned_images_with_fallback`] treats it as such).
pub fn scan_source_text(source: &str) -> Vec<String> {
    let mut images = BTreeSet::new();
    for line in source.lines() {
        let line = line.trim();
        let Some((lhs, rhs)) = line.split_once('=') else {
            continue;
        };
        if !lhs.trim_end().ends_with("_IMAGE") {
            continue;
        }
        if let Some(image) = unquote(rhs.trim()) {
            if !image.is_empty() {
                images.insert(image.to_string());
            }
        }
    }
    images.into_iter().collect()
}

/// Extract pinned images, preferring declared configuration and falling back
/// to a source-text scan only when the config declares no image options
pub fn pinned_images_with_fallback(config: &CharmConfig, source: &str) -> Result<Vec<String>> {
    match pinned_images(config) {
        Ok(images) => Ok(images),
        Err(Error::NoImages(_)) => {
            let images = scan_source_text(source);
            if images.is_empty() {
                Err(Error::NoImages(
                    "no declared image defaults and no assignment matched in source text"
                        .to_string(),
                ))
            } else {
                Ok(images)
            }
        }
        Err(e) => Err(e),
    }
}

fn unquote(value: &str) -> Option<&str> {
    let value = value
        .strip_suffix(',')
        .unwrap_or(value)
        .trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
}
