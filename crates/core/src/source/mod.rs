//! Source reference parsing and validation.
//!
//! A slate is always rooted in one reference artifact: a link to a release on
//! a streaming platform, or an internal handle of the form
//! `scheme://kind/identifier` minted by an upstream collaborator. Validation
//! here is structural only; resolving the reference is the external task
//! service's job.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while validating a pipeline start request.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The source reference was empty or whitespace.
    #[error("source reference is empty")]
    EmptyReference,

    /// The source reference is not a `scheme://...` URI.
    #[error("malformed source reference: {0}")]
    MalformedReference(String),

    /// An http(s) reference pointed at a host we don't recognize.
    #[error("unsupported platform host: {0}")]
    UnsupportedHost(String),

    /// The platform tag was missing or empty.
    #[error("platform tag is empty")]
    EmptyPlatformTag,
}

static URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*)://(.+)$").unwrap());

/// Streaming hosts we recognize, mapped to a canonical platform label.
const KNOWN_HOSTS: &[(&str, &str)] = &[
    ("open.spotify.com", "spotify"),
    ("spotify.com", "spotify"),
    ("play.spotify.com", "spotify"),
    ("youtube.com", "youtube"),
    ("www.youtube.com", "youtube"),
    ("music.youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("soundcloud.com", "soundcloud"),
    ("on.soundcloud.com", "soundcloud"),
    ("music.apple.com", "apple_music"),
    ("itunes.apple.com", "apple_music"),
    ("deezer.com", "deezer"),
    ("www.deezer.com", "deezer"),
    ("deezer.page.link", "deezer"),
    ("tidal.com", "tidal"),
    ("listen.tidal.com", "tidal"),
];

/// Host suffixes for platforms that hand every artist a subdomain.
const KNOWN_HOST_SUFFIXES: &[(&str, &str)] = &[(".bandcamp.com", "bandcamp")];

/// A validated source reference.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    /// The reference exactly as submitted.
    pub raw: String,
    /// URI scheme (lowercased).
    pub scheme: String,
    /// Host component, present for http(s) references.
    pub host: Option<String>,
    /// Canonical platform label when the host is a recognized streaming site.
    pub canonical_platform: Option<&'static str>,
}

impl SourceRef {
    /// Parse and validate a source reference.
    ///
    /// http(s) references must point at a recognized streaming host. Any
    /// other scheme is accepted as an internal handle as long as it carries a
    /// non-empty path (e.g. `ref://track/123`).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyReference);
        }

        let captures = URI_RE
            .captures(trimmed)
            .ok_or_else(|| ValidationError::MalformedReference(trimmed.to_string()))?;

        let scheme = captures[1].to_lowercase();
        let rest = &captures[2];

        if scheme == "http" || scheme == "https" {
            let host = rest
                .split('/')
                .next()
                .unwrap_or("")
                .split(':')
                .next()
                .unwrap_or("")
                .to_lowercase();
            if host.is_empty() {
                return Err(ValidationError::MalformedReference(trimmed.to_string()));
            }

            let canonical = lookup_host(&host)
                .ok_or_else(|| ValidationError::UnsupportedHost(host.clone()))?;

            return Ok(Self {
                raw: trimmed.to_string(),
                scheme,
                host: Some(host),
                canonical_platform: Some(canonical),
            });
        }

        // Internal handle: require something after the scheme besides slashes.
        if rest.split('/').all(|segment| segment.is_empty()) {
            return Err(ValidationError::MalformedReference(trimmed.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme,
            host: None,
            canonical_platform: None,
        })
    }
}

fn lookup_host(host: &str) -> Option<&'static str> {
    if let Some((_, platform)) = KNOWN_HOSTS.iter().find(|(h, _)| *h == host) {
        return Some(platform);
    }
    KNOWN_HOST_SUFFIXES
        .iter()
        .find(|(suffix, _)| host.ends_with(suffix))
        .map(|(_, platform)| *platform)
}

/// Validate the caller-supplied platform tag.
pub fn validate_platform_tag(tag: &str) -> Result<(), ValidationError> {
    if tag.trim().is_empty() {
        return Err(ValidationError::EmptyPlatformTag);
    }
    Ok(())
}
