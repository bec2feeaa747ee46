#![forbid(unsafe_code)]

//! Reqwest-backed [`SyncClient`].
//!
//! One client per persistence endpoint: the endpoint comes from the
//! container's configuration, so a page with several reorderable containers
//! holds several clients over one shared connection pool.
//!
//! The anti-forgery token is opaque here: a [`TokenProvider`] reads it from
//! wherever the page's auth layer keeps it, and the client attaches it as a
//! request header on every submission.

use crate::client::{Ack, SyncClient, SyncError};
use crate::payload::Update;

/// Default header name for the anti-forgery token.
pub const DEFAULT_TOKEN_HEADER: &str = "X-CSRF-TOKEN";

/// Source of the session's anti-forgery token.
pub trait TokenProvider {
    /// The current token, or `None` when the session has none.
    fn token(&self) -> Option<String>;
}

/// No token attached.
impl TokenProvider for () {
    fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed token captured at page load.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// HTTP implementation of the sync capability.
#[derive(Debug, Clone)]
pub struct HttpSyncClient<T = ()> {
    http: reqwest::Client,
    endpoint: String,
    token_header: String,
    tokens: T,
}

impl HttpSyncClient<()> {
    /// A client for an endpoint, with no anti-forgery token.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_tokens(endpoint, ())
    }
}

impl<T: TokenProvider> HttpSyncClient<T> {
    /// A client for an endpoint, attaching tokens from `tokens`.
    #[must_use]
    pub fn with_tokens(endpoint: impl Into<String>, tokens: T) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            tokens,
        }
    }

    /// Override the token header name.
    #[must_use]
    pub fn token_header(mut self, name: impl Into<String>) -> Self {
        self.token_header = name.into();
        self
    }

    /// Reuse an existing connection pool.
    #[must_use]
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<T: TokenProvider> SyncClient for HttpSyncClient<T> {
    async fn submit(&self, update: &Update) -> Result<Ack, SyncError> {
        tracing::debug!(endpoint = %self.endpoint, kind = update.kind(), "submitting update");
        let mut request = self.http.post(self.endpoint.as_str()).json(update);
        if let Some(token) = self.tokens.token() {
            request = request.header(&self.token_header, token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| SyncError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %self.endpoint, status = status.as_u16(), "update refused");
            return Err(SyncError::Status(status.as_u16()));
        }
        let ack: Ack = response
            .json()
            .await
            .map_err(|_| SyncError::MalformedResponse)?;
        if ack.success {
            Ok(ack)
        } else {
            tracing::warn!(endpoint = %self.endpoint, "update rejected by backend");
            Err(SyncError::Rejected { message: ack.message })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
