//! Reqwest-based HTTP client shared by the vendor adapters.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ReqwestConfig;
use crate::error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "redraft_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for calling vendor JSON and multipart APIs.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis() as u64,
            user_agent = %user_agent,
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()?;

        let inner = ReqwestClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Starts a POST request to `url`.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.inner.http.post(url)
    }

    /// Sends a JSON body and decodes a JSON response.
    pub(crate) async fn send_json<B, R>(&self, request: RequestBuilder, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = request.json(body).send().await?;
        decode(response).await
    }

    /// Sends a multipart form and decodes a JSON response, with a timeout
    /// overriding the client default.
    pub(crate) async fn send_multipart<R>(
        &self,
        request: RequestBuilder,
        form: Form,
        timeout: Duration,
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = request.multipart(form).timeout(timeout).send().await?;
        decode(response).await
    }
}

/// Reads the body of `response`, decoding it on success and turning it into
/// a status error otherwise.
async fn decode<R>(response: Response) -> Result<R>
where
    R: DeserializeOwned,
{
    let status = response.status();
    let url = response.url().path().to_owned();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            path = %url,
            "Vendor returned an error status"
        );
        return Err(Error::status(status, &body));
    }

    serde_json::from_str(&body).map_err(Error::from)
}
