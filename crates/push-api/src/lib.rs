//! MjoloBid notification API client.
//!
//! Registers and removes web-push subscriptions on the server. The client
//! sends the browser session cookie with every request, and it also serves
//! as the agent's [`SubscriptionRegistry`].

use async_trait::async_trait;
use push_agent::platform::SubscriptionRegistry;
use push_agent::{PlatformError, Subscription};
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;

pub const SUBSCRIBE_PATH: &str = "/notifications/api/push-subscribe/";
pub const UNSUBSCRIBE_PATH: &str = "/notifications/api/push-unsubscribe/";

/// Unified error type for the push-api crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid session cookie")]
    InvalidCookie,

    #[error("MjoloBid API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct UnsubscribeRequest<'a> {
    endpoint: &'a str,
}

/// HTTP client for the notification endpoints.
#[derive(Debug, Clone)]
pub struct PushApiClient {
    http: reqwest::Client,
    base_url: Url,
    subscribe_path: String,
    session_cookie: Option<String>,
}

impl PushApiClient {
    /// `base_url` is the site origin, e.g. `https://mjolobid.example`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            subscribe_path: SUBSCRIBE_PATH.to_string(),
            session_cookie: None,
        })
    }

    /// Raw `Cookie` header value carrying the logged-in session.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_subscribe_path(mut self, path: impl Into<String>) -> Self {
        self.subscribe_path = path.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &self.session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|_| ApiError::InvalidCookie)?;
            headers.insert(COOKIE, value);
        }
        Ok(headers)
    }

    /// POST a JSON body; any 2xx is success and the body is not read.
    async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<(), ApiError> {
        let url = self.base_url.join(path)?;
        let payload = serde_json::to_vec(body)?;
        let resp = self
            .http
            .post(url.clone())
            .headers(self.headers()?)
            .body(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), "Push API request rejected");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Store `subscription` for the logged-in user.
    pub async fn subscribe(&self, subscription: &Subscription) -> Result<(), ApiError> {
        self.post_json(&self.subscribe_path, subscription).await?;
        tracing::info!(endpoint = %subscription.endpoint, "Push subscription registered");
        Ok(())
    }

    /// Forget the subscription with this endpoint.
    pub async fn unsubscribe(&self, endpoint: &str) -> Result<(), ApiError> {
        self.post_json(UNSUBSCRIBE_PATH, &UnsubscribeRequest { endpoint })
            .await?;
        tracing::info!(endpoint, "Push subscription removed");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRegistry for PushApiClient {
    async fn register(&self, subscription: &Subscription) -> Result<(), PlatformError> {
        self.subscribe(subscription)
            .await
            .map_err(|e| PlatformError::Submit(e.to_string()))
    }
}

#[cfg(test)]
mod tests;
