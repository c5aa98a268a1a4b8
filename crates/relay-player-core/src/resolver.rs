//! Relay URL resolution
//!
//! Turns an operator-typed stream URL into a same-origin relay path of the
//! form `<prefix><percent-encoded absolute URL>`.

use crate::{Error, ResolvedTarget, Result, StreamRequest};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

/// Default relay path prefix
pub const DEFAULT_RELAY_PREFIX: &str = "/proxy/";

/// Characters escaped when embedding the upstream URL, matching
/// `encodeURIComponent` in browsers.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Maps raw stream URLs onto the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    prefix: String,
}

impl UrlResolver {
    /// Create a resolver with a custom relay prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Relay path prefix in use
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse `raw_url` and produce its relay-routed form
    pub fn resolve(&self, raw_url: &str) -> Result<ResolvedTarget> {
        let upstream = parse_absolute(raw_url)?;
        let relay_url = format!(
            "{}{}",
            self.prefix,
            utf8_percent_encode(upstream.as_str(), COMPONENT)
        );
        debug!(upstream = %upstream, relay_url = %relay_url, "Resolved stream URL");
        Ok(ResolvedTarget { relay_url })
    }

    /// Resolve a [`StreamRequest`]
    pub fn resolve_request(&self, request: &StreamRequest) -> Result<ResolvedTarget> {
        self.resolve(&request.raw_url)
    }

    /// Recover the canonical upstream URL embedded in a relay URL
    pub fn decode_relay_url(&self, relay_url: &str) -> Result<Url> {
        let encoded = relay_url
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| Error::NotARelayUrl { prefix: self.prefix.clone() })?;
        let decoded = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(Error::invalid_url)?;
        parse_absolute(&decoded)
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_PREFIX)
    }
}

/// Parse an absolute URL that carries both a scheme and a non-empty host
fn parse_absolute(raw_url: &str) -> Result<Url> {
    let url = Url::parse(raw_url.trim()).map_err(Error::invalid_url)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(Error::InvalidUrl(format!("missing host in {url}"))),
    }
}
