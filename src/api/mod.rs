// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Typed Blog API
//!
//! [`BlogApi`] turns backend endpoints into typed calls on top of the
//! [`Gateway`]. It owns the envelope handling and local validation; the
//! gateway owns credentials and retries.
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`BlogApi::signup`] | `POST /auth/signup` |
//! | [`BlogApi::login`] | `POST /auth/login` |
//! | [`BlogApi::logout`] | `POST /logout` (configurable) |
//! | [`BlogApi::list_blogs`] | `GET /blogs` |
//! | [`BlogApi::get_blog`] | `GET /blogs/{id}` |
//! | [`BlogApi::create_blog`] | `POST /blogs` |
//! | [`BlogApi::update_blog`] | `PUT /blogs/{id}` |
//! | [`BlogApi::delete_blog`] | `DELETE /blogs/{id}` |
//! | [`BlogApi::health`] | `GET /health` |

mod auth;
mod blogs;
pub mod error;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{DEFAULT_LOGOUT_PATH, GITHUB_AUTHORIZATION_PATH};
use crate::gateway::{Gateway, GatewayError, GatewayResponse, RequestDescriptor};
use crate::models::{ApiEnvelope, HealthStatus};

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct BlogApi {
    gateway: Gateway,
    logout_path: String,
    cancel: CancellationToken,
}

impl BlogApi {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    /// Abort every in-flight and future call once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// A bearer token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.gateway.store().bearer_token().is_some()
    }

    /// Absolute URL that starts the GitHub OAuth flow in a browser.
    pub fn github_authorization_url(&self) -> ApiResult<Url> {
        Ok(self.gateway.url_for(GITHUB_AUTHORIZATION_PATH)?)
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let response = self.send(RequestDescriptor::get("/health")).await?;
        Ok(response.decode()?)
    }

    async fn send(&self, descriptor: RequestDescriptor) -> ApiResult<GatewayResponse> {
        Ok(self
            .gateway
            .send_with_cancel(descriptor, &self.cancel)
            .await?)
    }
}

/// Unwrap the standard envelope.
///
/// Empty bodies become an empty successful envelope. A body without
/// `success` or `data` is taken as the data itself.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    response: GatewayResponse,
) -> ApiResult<ApiEnvelope<T>> {
    let enveloped = match &response.payload {
        Value::Null => {
            return Ok(ApiEnvelope {
                success: true,
                message: None,
                data: None,
                count: None,
            })
        }
        Value::Object(map) => map.contains_key("success") || map.contains_key("data"),
        _ => false,
    };

    if !enveloped {
        return Ok(ApiEnvelope {
            success: true,
            message: None,
            data: Some(response.decode()?),
            count: None,
        });
    }

    let envelope: ApiEnvelope<T> = response.decode()?;
    if !envelope.success {
        return Err(ApiError::Unsuccessful {
            message: envelope.message,
        });
    }
    Ok(envelope)
}

pub(crate) fn require_data<T>(envelope: ApiEnvelope<T>) -> ApiResult<T> {
    envelope.data.ok_or_else(|| {
        GatewayError::InvalidResponse("response carried no data".to_string()).into()
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::api_with;
    use super::*;
    use crate::gateway::testing::Reply;
    use crate::models::Blog;
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    fn response(payload: Value) -> GatewayResponse {
        GatewayResponse {
            status: StatusCode::OK,
            payload,
            csrf_refreshed: false,
        }
    }

    #[test]
    fn bare_payload_is_treated_as_data() {
        let envelope: ApiEnvelope<Blog> =
            unwrap_envelope(response(json!({"id": 1, "title": "T", "content": "C"}))).unwrap();
        assert_eq!(envelope.data.unwrap().id, 1);
    }

    #[test]
    fn unsuccessful_envelope_is_an_error() {
        let err = unwrap_envelope::<Blog>(response(json!({
            "success": false,
            "message": "Authentication required"
        })))
        .unwrap_err();
        assert_eq!(err.display_message(), "Authentication required");
    }

    #[test]
    fn empty_body_has_no_data() {
        let envelope = unwrap_envelope::<Blog>(response(Value::Null)).unwrap();
        assert!(matches!(
            require_data(envelope),
            Err(ApiError::Gateway(GatewayError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn github_url_is_absolute() {
        let (api, _, _) = api_with(None, None);
        assert_eq!(
            api.github_authorization_url().unwrap().as_str(),
            "http://localhost:8080/oauth2/authorization/github"
        );
    }

    #[tokio::test]
    async fn health_reports_backend_status() {
        let (api, transport, _) = api_with(None, None);
        transport.on(
            Method::GET,
            "/health",
            Reply::Json(200, json!({"status": "UP", "message": "Blog API is running"})),
        );
        assert_eq!(api.health().await.unwrap().status, "UP");
    }

    #[tokio::test]
    async fn cancelled_api_fails_fast() {
        let (api, transport, _) = api_with(Some("jwt"), None);
        transport.on(Method::GET, "/blogs", Reply::Hang);
        let cancel = CancellationToken::new();
        let api = api.with_cancellation(cancel.clone());
        cancel.cancel();

        let err = api.list_blogs().await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
