//! Authenticated request pipeline
//!
//! Every outbound call goes through [`ApiClient::send`]:
//! 1. the current access token is attached as `Authorization: Bearer <token>`
//! 2. a non-401 response is handed back unchanged
//! 3. a 401 triggers one token refresh through the [`SessionManager`], then the
//!    request is re-issued with the new token
//! 4. a 401 on the re-issued request is final
//!
//! [`ApiRequest`] is immutable; the retry count is carried by the pipeline itself.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use super::error::{ApiError, extract_error_message};
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::core::auth::{SessionManager, SessionStore};

/// Number of refresh-and-retry rounds a single request may go through
pub const MAX_REFRESH_RETRIES: u32 = 1;

/// Outbound request descriptor: method, path relative to the API base and an
/// optional JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Resolve against `base_url`, adding the bearer token when there is one
    pub fn to_http(&self, base_url: &str, access_token: Option<&str>) -> HttpRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];

        if self.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = access_token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        HttpRequest {
            method: self.method,
            url: join_url(base_url, &self.path),
            headers,
            body: self.body.clone(),
        }
    }
}

/// Join the API base and a path with exactly one slash between them
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a non-success response into [`ApiError::Http`]
pub fn ensure_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Http {
            status: response.status,
            message: extract_error_message(&response.body),
        })
    }
}

/// Client for authenticated calls. Cheap to clone; all clones share one session.
pub struct ApiClient<S, T> {
    session: Arc<SessionManager<S, T>>,
}

impl<S, T> Clone for ApiClient<S, T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S, T> ApiClient<S, T>
where
    S: SessionStore,
    T: HttpTransport,
{
    pub fn new(session: Arc<SessionManager<S, T>>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager<S, T> {
        &self.session
    }

    /// Send `request` with credentials, refreshing the access token at most once
    pub async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let span = tracing::debug_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            path = %request.path,
        );
        self.dispatch(request, 0).instrument(span).await
    }

    /// Send and decode a successful JSON response
    pub async fn send_json<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, ApiError> {
        let response = ensure_success(self.send(request).await?)?;
        Ok(response.json()?)
    }

    async fn dispatch(&self, request: &ApiRequest, mut retries: u32) -> Result<HttpResponse, ApiError> {
        let mut token = self.session.access_token();

        loop {
            let http = request.to_http(self.session.base_url(), token.as_deref());
            let response = self.session.transport().send(http).await?;

            if !response.is_unauthorized() {
                tracing::debug!(status = response.status, "Request completed");
                return Ok(response);
            }

            if retries >= MAX_REFRESH_RETRIES {
                tracing::warn!("Request still unauthorized after token refresh");
                return Err(ApiError::Auth(extract_error_message(&response.body)));
            }

            let fresh = self.session.refresh_access_token(token.as_deref()).await?;
            token = Some(fresh);
            retries += 1;
        }
    }
}
