//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's headers
//! - Classifying each attempt as success, retryable or terminal
//! - The single HTTPS-to-HTTP fallback after a connection-level failure
//! - Following redirects by hand, asking a guard before each hop
//! - Size-capped body reads and charset decoding

use crate::config::UserAgentConfig;
use crate::url::{downgrade_url, normalize_parsed, visit_key};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_LANGUAGE_VALUE: &str = "bn-BD,bn;q=0.9,en-US;q=0.8,en;q=0.7";
const MAX_REDIRECTS: usize = 10;

/// Why a page could not be turned into text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("unsupported content type '{0}'")]
    NotHtml(String),

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body is not valid {charset} text")]
    Decode { charset: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("more than {limit} redirects")]
    TooManyRedirects { limit: usize },

    #[error("redirect loop at {0}")]
    RedirectLoop(String),
}

impl FetchFailure {
    /// Returns true for connection-level failures (refused, reset, TLS, timeout)
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Answer of a [`RedirectGuard`] for one redirect target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectCheck {
    /// Request the target
    Follow,
    /// The target belongs to another domain
    OffDomain,
    /// The target was already requested for this domain
    AlreadyVisited,
}

impl std::fmt::Display for RedirectCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Follow => write!(f, "follow"),
            Self::OffDomain => write!(f, "target is off-domain"),
            Self::AlreadyVisited => write!(f, "target already visited"),
        }
    }
}

/// Decides whether a redirect may be followed
///
/// Consulted once per hop whose target is a different page than the URL
/// being requested; scheme or `www.` changes of the same page are always
/// followed.
pub trait RedirectGuard: Send + Sync {
    fn check(&self, target: &Url) -> RedirectCheck;
}

/// Guard that follows every redirect
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowAll;

impl RedirectGuard for FollowAll {
    fn check(&self, _target: &Url) -> RedirectCheck {
        RedirectCheck::Follow
    }
}

/// What a fetch produced
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was retrieved and decoded
    Page {
        /// HTTP status code
        status: u16,
        /// Decoded page body
        body: String,
    },

    /// A redirect was not followed; nothing was read
    Skipped(RedirectCheck),

    /// The page was abandoned
    Failed(FetchFailure),
}

/// Result of fetching one URL
#[derive(Debug)]
pub struct FetchResult {
    /// URL the content came from, after fallback and redirects; for a
    /// skipped redirect, the target that was not followed
    pub final_url: Url,
    /// Number of protocol attempts: 1, or 2 when the fallback ran
    pub attempts: u8,
    /// The page, the skip or the failure
    pub outcome: FetchOutcome,
}

/// Classification of a single attempt
#[derive(Debug)]
pub(crate) enum Attempt {
    Success {
        final_url: Url,
        status: u16,
        body: String,
    },
    Skipped {
        target: Url,
        check: RedirectCheck,
    },
    /// Connection-level failure; eligible for the protocol fallback
    Retryable(FetchFailure),
    Terminal(FetchFailure),
}

/// Builds an HTTP client with the crawler's identity and limits
///
/// Redirects are not followed by the client; [`Fetcher`] follows them itself.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use word_ripple::config::UserAgentConfig;
/// use word_ripple::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves pages, falling back from https to http at most once
///
/// The fetcher keeps no per-domain state; pacing lives in the rate limiter
/// and the visited-set behind the [`RedirectGuard`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(client: Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    /// Fetches `url`
    ///
    /// # Request Flow
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx with HTML content type | Decode body → Page |
    /// | 3xx with Location, guard says follow | Request the target (max 10 hops) |
    /// | 3xx the guard refuses | Skipped, nothing read |
    /// | Redirect loop or chain > 10 | Failed, no retry |
    /// | Connection refused, reset, TLS failure, timeout on https | One retry on http |
    /// | Same failure on http, or on the fallback | Failed (Network) |
    /// | Non-2xx status | Failed (HttpStatus), no retry |
    /// | Non-HTML content type | Failed (NotHtml), no retry |
    /// | Body larger than the limit | Failed (TooLarge), no retry |
    /// | Undecodable body | Failed (Decode), no retry |
    pub async fn fetch(&self, url: &Url, guard: &dyn RedirectGuard) -> FetchResult {
        let (attempt, attempted_url, attempts) =
            attempt_with_fallback(url, |start| self.attempt(start, guard)).await;

        let (final_url, outcome) = match attempt {
            Attempt::Success {
                final_url,
                status,
                body,
            } => (final_url, FetchOutcome::Page { status, body }),
            Attempt::Skipped { target, check } => (target, FetchOutcome::Skipped(check)),
            Attempt::Retryable(failure) | Attempt::Terminal(failure) => {
                (attempted_url, FetchOutcome::Failed(failure))
            }
        };

        FetchResult {
            final_url,
            attempts,
            outcome,
        }
    }

    /// Requests `start` and follows its redirects, classifying the result
    async fn attempt(&self, start: Url, guard: &dyn RedirectGuard) -> Attempt {
        let mut current = start;
        let mut chain = HashSet::new();
        chain.insert(current.to_string());

        let response = loop {
            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                // only the first hop may fall back to http
                Err(e) if chain.len() == 1 => return classify_request_error(&e),
                Err(e) => return Attempt::Terminal(FetchFailure::Network(error_chain(&e))),
            };

            if !response.status().is_redirection() {
                break response;
            }

            let status = response.status().as_u16();
            let Some(target) = redirect_target(&response, &current) else {
                return Attempt::Terminal(FetchFailure::HttpStatus(status));
            };
            let target = match normalize_parsed(target) {
                Ok(target) => target,
                Err(e) => return Attempt::Terminal(FetchFailure::InvalidUrl(e.to_string())),
            };

            if chain.len() > MAX_REDIRECTS {
                return Attempt::Terminal(FetchFailure::TooManyRedirects {
                    limit: MAX_REDIRECTS,
                });
            }
            if !chain.insert(target.to_string()) {
                return Attempt::Terminal(FetchFailure::RedirectLoop(target.to_string()));
            }

            if visit_key(&target) != visit_key(&current) {
                match guard.check(&target) {
                    RedirectCheck::Follow => {}
                    check => return Attempt::Skipped { target, check },
                }
            }

            tracing::debug!(from = %current, to = %target, status, "following redirect");
            current = target;
        };

        let status = response.status();

        if !status.is_success() {
            return Attempt::Terminal(FetchFailure::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Attempt::Terminal(FetchFailure::NotHtml(content_type));
        }

        let bytes = match self.read_body(response).await {
            Ok(bytes) => bytes,
            Err(failure) => return Attempt::Terminal(failure),
        };

        match decode_body(&bytes, &content_type) {
            Ok(body) => Attempt::Success {
                final_url: current,
                status: status.as_u16(),
                body,
            },
            Err(failure) => Attempt::Terminal(failure),
        }
    }

    /// Reads the response body, giving up once it passes the size limit
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, FetchFailure> {
        let limit = self.max_body_bytes;

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchFailure::TooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchFailure::Network(error_chain(&e)))?
        {
            if body.len() + chunk.len() > limit {
                return Err(FetchFailure::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

/// Resolves the Location header of a redirect against the requested URL
fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location.trim()).ok()
}

/// Runs one attempt and, if it failed at the connection level on https,
/// exactly one more on the http twin of the URL
///
/// Returns the final attempt, the URL it targeted and the number of attempts.
pub(crate) async fn attempt_with_fallback<F, Fut>(url: &Url, mut attempt: F) -> (Attempt, Url, u8)
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Attempt>,
{
    let first = attempt(url.clone()).await;

    let failure = match first {
        Attempt::Retryable(failure) => failure,
        other => return (other, url.clone(), 1),
    };

    match downgrade_url(url) {
        Some(fallback) => {
            tracing::warn!(url = %url, error = %failure, "https failed, falling back to {}", fallback);
            let second = match attempt(fallback.clone()).await {
                Attempt::Retryable(failure) => Attempt::Terminal(failure),
                other => other,
            };
            if matches!(second, Attempt::Success { .. }) {
                tracing::info!(url = %url, "fallback to http succeeded");
            }
            (second, fallback, 2)
        }
        None => (Attempt::Terminal(failure), url.clone(), 1),
    }
}

/// Maps a reqwest error onto the retry policy
fn classify_request_error(error: &reqwest::Error) -> Attempt {
    let message = error_chain(error);

    if error.is_builder() {
        Attempt::Terminal(FetchFailure::InvalidUrl(message))
    } else if error.is_redirect() {
        Attempt::Terminal(FetchFailure::Network(message))
    } else if error.is_connect() || error.is_timeout() || error.is_request() {
        Attempt::Retryable(FetchFailure::Network(message))
    } else {
        Attempt::Terminal(FetchFailure::Network(message))
    }
}

/// Formats an error with all of its sources, outermost first
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Returns true for content types the link extractor can read
pub fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Extracts the charset parameter from a Content-Type header value
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decodes a body to Unicode text
///
/// The charset comes from the Content-Type header and defaults to UTF-8; a
/// byte order mark overrides both. Any malformed sequence makes the whole
/// body a decode failure.
pub fn decode_body(bytes: &[u8], content_type: &str) -> Result<String, FetchFailure> {
    let encoding = match charset_label(content_type) {
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            tracing::debug!(charset = label, "unknown charset, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchFailure::Decode {
            charset: used.name().to_string(),
        });
    }

    Ok(text.into_owned())
}
