// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signup, login and logout.
//!
//! Login and signup start from a clean slate: any stored bearer token and
//! CSRF token are dropped before the credentials are posted so a stale
//! session can never leak into a new one. Login first ends the previous
//! server session with those same credentials.

use tracing::{info, warn};

use super::{unwrap_envelope, ApiError, ApiResult, BlogApi};
use crate::gateway::{GatewayError, RequestDescriptor};
use crate::models::{Credentials, LoginResponse, LoginSession};

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

impl BlogApi {
    /// Register a new account. Returns the backend's confirmation message.
    pub async fn signup(&self, credentials: &Credentials) -> ApiResult<Option<String>> {
        self.gateway.store().clear()?;
        if self.gateway.config().strategy.uses_csrf() {
            self.gateway.refresh_csrf(&self.cancel).await?;
        }

        let descriptor = RequestDescriptor::post("/auth/signup").json(credentials)?;
        let envelope = unwrap_envelope::<serde_json::Value>(self.send(descriptor).await?)?;

        info!(username = %credentials.username, "Account registered");
        Ok(envelope.message)
    }

    /// Authenticate and store the issued bearer token.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginSession> {
        // The old session must still be attached for the server to drop it.
        let ended = self.end_server_session().await;
        self.gateway.store().clear()?;
        ended?;

        let descriptor = RequestDescriptor::post("/auth/login").json(credentials)?;
        let response: LoginResponse = match self.send(descriptor).await {
            Ok(response) => response.decode()?,
            // No session exists yet, so an auth failure means bad credentials.
            Err(e) if e.is_auth_expired() => {
                warn!(username = %credentials.username, "Login rejected");
                return Err(ApiError::Unsuccessful {
                    message: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
                });
            }
            Err(e) => return Err(e),
        };

        if response.success == Some(false) {
            return Err(ApiError::Unsuccessful {
                message: response.message,
            });
        }
        let Some(token) = response.token.filter(|t| !t.trim().is_empty()) else {
            warn!(username = %credentials.username, "Login succeeded without a token");
            return Err(ApiError::MissingToken);
        };
        self.gateway.store().set_bearer_token(Some(&token))?;

        info!(username = %credentials.username, "Logged in");
        Ok(LoginSession {
            username: response.username,
            role: response.role,
            message: response.message,
        })
    }

    /// End the server session and forget all local credentials.
    ///
    /// Local credentials are cleared even when the server call fails.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.end_server_session().await;
        self.gateway.store().clear()?;
        result?;
        info!("Logged out");
        Ok(())
    }

    /// Best-effort `POST` to the logout endpoint. Only cancellation is
    /// reported.
    async fn end_server_session(&self) -> ApiResult<()> {
        match self.send(RequestDescriptor::post(self.logout_path.clone())).await {
            Ok(_) => Ok(()),
            Err(ApiError::Gateway(GatewayError::Cancelled)) => {
                Err(GatewayError::Cancelled.into())
            }
            Err(e) => {
                warn!(error = %e, "Server logout failed, continuing");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::api_with;
    use super::*;
    use crate::gateway::testing::Reply;
    use crate::session::CredentialStore;
    use reqwest::Method;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("ada", "secret")
    }

    #[tokio::test]
    async fn login_ends_old_server_session_then_stores_token() {
        let (api, transport, store) = api_with(Some("old-jwt"), Some("csrf-1"));
        transport
            .on(Method::POST, "/logout", Reply::Status(200))
            .on(
                Method::POST,
                "/auth/login",
                Reply::Json(
                    200,
                    json!({
                        "success": true,
                        "message": "Login successful",
                        "token": "new-jwt",
                        "username": "ada",
                        "role": "USER"
                    }),
                ),
            )
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "csrf-2"));

        let session = api.login(&creds()).await.unwrap();

        assert_eq!(session.username.as_deref(), Some("ada"));
        assert_eq!(session.role.as_deref(), Some("USER"));
        assert_eq!(store.bearer_token().as_deref(), Some("new-jwt"));

        // The server logout still carries the old session.
        let logout = transport.requests_to(&Method::POST, "/logout");
        assert_eq!(logout.len(), 1);
        assert_eq!(logout[0].header("authorization"), Some("Bearer old-jwt"));
        assert_eq!(logout[0].header("x-xsrf-token"), Some("csrf-1"));

        // The login itself does not.
        let login = transport.requests_to(&Method::POST, "/auth/login");
        assert_eq!(login[0].body, Some(json!({"username": "ada", "password": "secret"})));
        assert!(login[0].header("authorization").is_none());
        assert_eq!(login[0].header("x-xsrf-token"), Some("csrf-2"));
        assert_eq!(transport.count(&Method::GET, "/api/csrf"), 1);
    }

    #[tokio::test]
    async fn login_without_token_is_an_error() {
        let (api, transport, store) = api_with(None, Some("csrf"));
        transport
            .on(Method::POST, "/logout", Reply::Status(200))
            .on(
                Method::POST,
                "/auth/login",
                Reply::Json(200, json!({"success": true, "message": "Login successful"})),
            );

        let err = api.login(&creds()).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
        assert!(store.bearer_token().is_none());
    }

    #[tokio::test]
    async fn login_proceeds_when_server_logout_fails() {
        let (api, transport, store) = api_with(None, Some("csrf"));
        transport
            .on(Method::POST, "/logout", Reply::Network)
            .on(
                Method::POST,
                "/auth/login",
                Reply::Json(200, json!({"success": true, "token": "jwt"})),
            );

        api.login(&creds()).await.unwrap();
        assert_eq!(store.bearer_token().as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn rejected_login_reports_invalid_credentials() {
        let (api, transport, store) = api_with(None, Some("csrf"));
        transport
            .on(Method::POST, "/logout", Reply::Status(200))
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "fresh"))
            .on(
                Method::POST,
                "/auth/login",
                Reply::Json(401, json!({"success": false, "message": "Bad credentials"})),
            );

        let err = api.login(&creds()).await.unwrap_err();
        assert!(!err.is_auth_expired());
        assert_eq!(err.display_message(), INVALID_CREDENTIALS_MESSAGE);
        assert!(store.bearer_token().is_none());
    }

    #[tokio::test]
    async fn signup_primes_csrf_before_posting() {
        let (api, transport, _) = api_with(Some("old-jwt"), None);
        transport
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "primed"))
            .on(
                Method::POST,
                "/auth/signup",
                Reply::Json(
                    200,
                    json!({"success": true, "message": "User registered successfully"}),
                ),
            );

        let message = api.signup(&creds()).await.unwrap();
        assert_eq!(message.as_deref(), Some("User registered successfully"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/api/csrf");
        assert_eq!(requests[1].header("x-xsrf-token"), Some("primed"));
        assert!(requests[1].header("authorization").is_none());
    }

    #[tokio::test]
    async fn signup_conflict_is_remote_rejected() {
        let (api, transport, _) = api_with(None, None);
        transport
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "primed"))
            .on(
                Method::POST,
                "/auth/signup",
                Reply::Json(409, json!({"success": false, "message": "User already exists!"})),
            );

        let err = api.signup(&creds()).await.unwrap_err();
        assert_eq!(err.display_message(), "User already exists!");
    }

    #[tokio::test]
    async fn logout_clears_credentials_even_on_failure() {
        let (api, transport, store) = api_with(Some("jwt"), Some("csrf"));
        transport.on(Method::POST, "/logout", Reply::Status(500));

        api.logout().await.unwrap();
        assert!(store.bearer_token().is_none());
        assert!(store.csrf_token().is_none());
        assert!(!api.is_authenticated());
    }
}
