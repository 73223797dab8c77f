//! Connection targets shared by the resource handles.

use std::fmt;

use muster_core::{Addon, AddonError, describe};
use thiserror::Error;

/// Errors raised when a configured URL cannot address a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The URL was empty.
    #[error("endpoint URL is empty")]
    Empty,
    /// The URL has no `scheme:` prefix.
    #[error("endpoint URL '{url}' has no scheme")]
    MissingScheme {
        /// Offending URL.
        url: String,
    },
    /// Nothing follows the scheme.
    #[error("endpoint URL '{url}' has no address after its scheme")]
    MissingAddress {
        /// Offending URL.
        url: String,
    },
}

/// A validated `scheme:address` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    scheme_len: usize,
}

impl Endpoint {
    /// Validates `url`.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] when the URL is empty or lacks a scheme
    /// or address.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(EndpointError::Empty);
        }
        let Some((scheme, address)) = url.split_once(':') else {
            return Err(EndpointError::MissingScheme {
                url: url.to_owned(),
            });
        };
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(EndpointError::MissingScheme {
                url: url.to_owned(),
            });
        }
        if address.trim_start_matches('/').is_empty() {
            return Err(EndpointError::MissingAddress {
                url: url.to_owned(),
            });
        }
        Ok(Self {
            url: url.to_owned(),
            scheme_len: scheme.len(),
        })
    }

    /// The full URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The scheme, without the trailing colon.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.get(..self.scheme_len).unwrap_or_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Parses `url` on behalf of `addon`, reporting failures as hook errors.
pub(crate) fn endpoint_for(addon: &dyn Addon, url: &str) -> Result<Endpoint, AddonError> {
    Endpoint::parse(url).map_err(|error| AddonError::hook(describe(addon), error.to_string()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::jdbc("jdbc:postgresql://db/orders", "jdbc")]
    #[case::tcp("tcp://broker:61616", "tcp")]
    #[case::mem("jdbc:h2:mem:test", "jdbc")]
    #[case::padded("  https://tokens  ", "https")]
    fn valid_urls_parse(#[case] url: &str, #[case] scheme: &str) {
        let endpoint = Endpoint::parse(url).expect("valid url");
        assert_eq!(endpoint.scheme(), scheme);
        assert_eq!(endpoint.as_str(), url.trim());
    }

    #[rstest]
    #[case::empty("   ", EndpointError::Empty)]
    #[case::no_scheme("localhost", EndpointError::MissingScheme { url: String::from("localhost") })]
    #[case::bad_scheme("1tcp://x", EndpointError::MissingScheme { url: String::from("1tcp://x") })]
    #[case::no_address("tcp://", EndpointError::MissingAddress { url: String::from("tcp://") })]
    fn invalid_urls_are_rejected(#[case] url: &str, #[case] expected: EndpointError) {
        assert_eq!(Endpoint::parse(url), Err(expected));
    }
}
