//! HTTP client for the tracker and breathing endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::csrf;
use crate::breathing::{SessionApi, SessionRequest, SessionResponse};
use crate::error::ApiError;
use crate::storage::ServerConfig;
use crate::tracker::{TapApi, TapRequest, TapResponse};

pub const TAP_PATH: &str = "/api/activity/tap/";
pub const SESSION_PATH: &str = "/breathe/api/session/";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    csrf_token: Option<String>,
    cookie: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::new(),
            base: Url::parse(base_url)?,
            csrf_token: None,
            cookie: None,
        })
    }

    /// Build from the `[server]` section of the config.
    pub fn from_config(server: &ServerConfig) -> Result<Self, ApiError> {
        let mut client = Self::new(&server.base_url)?;
        client.cookie = server.cookie.clone().filter(|c| !c.is_empty());
        client.csrf_token = csrf::resolve(server.csrf_token.as_deref(), client.cookie.as_deref());
        if client.csrf_token.is_none() {
            tracing::warn!("no CSRF token configured; POSTs will likely be rejected");
        }
        Ok(client)
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// The body is decoded whatever the status: the server reports refusals
    /// (including 429) as JSON. Only a non-success status with an
    /// undecodable body becomes [`ApiError::Status`].
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.base.join(path)?;
        let response = self
            .http
            .post(url)
            .headers(self.headers())
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "response received");
        let text = response.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.csrf_token {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(csrf::HEADER, value);
                }
                Err(e) => tracing::warn!("CSRF token is not a valid header value: {e}"),
            }
        }
        if let Some(cookie) = &self.cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => tracing::warn!("cookie is not a valid header value: {e}"),
            }
        }
        headers
    }
}

#[async_trait]
impl TapApi for ApiClient {
    async fn tap(&self, request: &TapRequest) -> Result<TapResponse, ApiError> {
        self.post_json(TAP_PATH, request).await
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn session(&self, request: &SessionRequest) -> Result<SessionResponse, ApiError> {
        self.post_json(SESSION_PATH, request).await
    }
}
