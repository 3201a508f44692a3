use reqwest::Url;
use thiserror::Error;

use crate::provider::ProviderId;

/// Why a single provider attempt produced no reading.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured (no API key)")]
    Unavailable { provider: ProviderId },

    #[error("{provider} request failed: {message}")]
    RequestFailed { provider: ProviderId, message: String },

    #[error("{provider} returned an unexpected response: {message}")]
    ResponseMalformed { provider: ProviderId, message: String },

    #[error("{provider} produced no result: {reason}")]
    NoResult { provider: ProviderId, reason: &'static str },

    #[error("failed to build HTTP client for {provider}: {source}")]
    Client {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Transport failure. The request URL is appended with API keys removed.
    pub fn request(provider: ProviderId, err: reqwest::Error) -> Self {
        let url = err.url().map(redacted_url);
        let err = err.without_url();

        let mut message = if err.is_timeout() {
            format!("timed out: {err}")
        } else {
            err.to_string()
        };
        if let Some(url) = url {
            message.push_str(&format!(" ({url})"));
        }
        Self::RequestFailed { provider, message }
    }

    pub fn malformed(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::ResponseMalformed { provider, message: message.into() }
    }
}

/// Query parameters that carry API keys.
const SECRET_PARAMS: &[&str] = &["key", "appid", "apikey"];

fn redacted_url(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !SECRET_PARAMS.contains(&name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut clean = url.clone();
    clean.set_query(None);
    if !kept.is_empty() {
        clean.query_pairs_mut().extend_pairs(kept);
    }
    clean.to_string()
}

/// Resolver-internal outcome when every eligible provider came up empty.
#[derive(Debug, Error)]
pub(crate) enum ResolveError {
    #[error("all providers exhausted ({attempted} attempted)")]
    AllProvidersExhausted { attempted: usize },
}
