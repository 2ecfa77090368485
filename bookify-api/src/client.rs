//! Async HTTP client for the book endpoints.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::credentials::{Anonymous, CredentialProvider};
use crate::error::{ApiError, Result};
use crate::models::{BookDetail, BookId, ReadinessStatus};

/// Connection settings for [`BookClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the book API, e.g. `http://localhost:8080/api/book`
    pub base_url: String,

    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Whole-request timeout
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080/api/book";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the BookifyAI book API.
///
/// Cloning is cheap; clones share the connection pool and credential
/// provider.
#[derive(Clone)]
pub struct BookClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl BookClient {
    /// Create an anonymous client with default timeouts.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            credentials: Arc::new(Anonymous),
        })
    }

    /// Attach a credential provider consulted on every request.
    pub fn with_credentials(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.credentials = Arc::new(provider);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the rendered PDF, suitable for handing to a viewer.
    pub fn pdf_url(&self, id: BookId) -> Result<Url> {
        self.endpoint(id, Some("pdf"))
    }

    /// `GET /{id}/status`
    pub async fn readiness(&self, id: BookId) -> Result<ReadinessStatus> {
        let url = self.endpoint(id, Some("status"))?;
        self.get_json(url).await
    }

    /// `GET /{id}`
    pub async fn book(&self, id: BookId) -> Result<BookDetail> {
        let url = self.endpoint(id, None)?;
        self.get_json(url).await
    }

    /// `GET /{id}/pdf`
    pub async fn download_pdf(&self, id: BookId) -> Result<Bytes> {
        let url = self.pdf_url(id)?;
        let response = self.send(self.http.get(url)).await?;
        Ok(response.bytes().await?)
    }

    /// `POST /{id}/download`
    pub async fn record_download(&self, id: BookId) -> Result<()> {
        let url = self.endpoint(id, Some("download"))?;
        self.send(self.http.post(url)).await.map(|_| ())
    }

    /// `POST /{id}/view`
    pub async fn record_view(&self, id: BookId) -> Result<()> {
        let url = self.endpoint(id, Some("view"))?;
        self.send(self.http.post(url)).await.map(|_| ())
    }

    fn endpoint(&self, id: BookId, suffix: Option<&str>) -> Result<Url> {
        let path = match suffix {
            Some(suffix) => format!("{}/{}", id, suffix),
            None => id.to_string(),
        };
        Ok(self.base_url.join(&path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(self.http.get(url)).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "book API request failed");
        Err(ApiError::from_status(status.as_u16(), &body))
    }
}

impl fmt::Debug for BookClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_keep_base_path() {
        let client = BookClient::new("http://localhost:8080/api/book").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/book/");

        let id = BookId::new(42);
        assert_eq!(
            client.endpoint(id, Some("status")).unwrap().as_str(),
            "http://localhost:8080/api/book/42/status"
        );
        assert_eq!(
            client.endpoint(id, None).unwrap().as_str(),
            "http://localhost:8080/api/book/42"
        );
        assert_eq!(
            client.pdf_url(id).unwrap().as_str(),
            "http://localhost:8080/api/book/42/pdf"
        );
    }

    #[test]
    fn test_trailing_slash_base_is_untouched() {
        let client = BookClient::new("https://bookify.example/api/book/").unwrap();
        assert_eq!(client.base_url().as_str(), "https://bookify.example/api/book/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            BookClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            BookClient::new("mailto:someone@example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = BookClient::new("http://localhost:8080/api/book")
            .unwrap()
            .with_credentials(crate::StaticToken::new("secret"));
        let debug = format!("{:?}", client);
        assert!(debug.contains("localhost:8080"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, ClientConfig::DEFAULT_BASE_URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
