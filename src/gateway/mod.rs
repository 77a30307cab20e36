// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authenticated Request Gateway
//!
//! Every call to the blog backend goes through [`Gateway::send`].
//!
//! ## Flow
//!
//! 1. State-changing calls (`POST`, `PUT`, `DELETE`, `PATCH`) under the
//!    `CookieSessionWithCsrf` strategy read the CSRF token from the
//!    credential store. If none is stored, a **bootstrap** GET to the CSRF
//!    endpoint fetches one. A failed bootstrap is logged and the call goes
//!    out without the header.
//! 2. `Authorization: Bearer <token>` is attached when a token is stored.
//! 3. The CSRF token, if any, is echoed in the configured header.
//! 4. First attempt:
//!    - 2xx → payload
//!    - 401 → `AuthExpired`
//!    - 403 on a CSRF-protected call → bootstrap again and retry once
//!    - no response → `NetworkError`
//!    - anything else → `RemoteRejected`
//! 5. Second attempt (never retried): 2xx → payload flagged
//!    `csrf_refreshed`; any failure → `AuthExpired`.
//!
//! ```text
//! Unsent → FirstAttempt → Success
//!                       → Failed
//!                       → NeedsCsrfRefresh → SecondAttempt → Success | Failed
//! ```
//!
//! At most two transmissions and two bootstraps per call. Attempts are
//! strictly sequential.
//!
//! ## Cancellation and timeouts
//!
//! Each transmission (bootstrap included) is bounded by
//! `GatewayConfig::attempt_timeout`; expiry is a `NetworkError`. Cancelling
//! the token passed to [`Gateway::send_with_cancel`] drops the in-flight
//! transport future and yields `Cancelled`.

pub mod error;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::session::CredentialStore;

pub use error::{extract_message, GatewayError, GENERIC_FAILURE_MESSAGE};
pub use request::{is_state_changing, GatewayResponse, RequestDescriptor};
pub use transport::{HttpTransport, OutboundRequest, Transport, TransportError, TransportResponse};

use request::decode_body;

/// Per-call state.
#[derive(Debug)]
enum AttemptState {
    Unsent,
    FirstAttempt { csrf: Option<String> },
    NeedsCsrfRefresh,
    SecondAttempt { csrf: Option<String> },
    Success(GatewayResponse),
    Failed(GatewayError),
}

/// Why a transmission produced no response.
enum TransmitFailure {
    Network(String),
    Cancelled,
}

/// Single choke point for requests to the blog backend.
#[derive(Clone)]
pub struct Gateway {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Resolve `path` against the base URL, keeping any base path prefix.
    pub fn url_for(&self, path: &str) -> Result<Url, GatewayError> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid path '{path}': {e}")))
    }

    /// Send `descriptor` (see the module docs for the full flow).
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<GatewayResponse, GatewayError> {
        self.send_with_cancel(descriptor, &CancellationToken::new())
            .await
    }

    /// Like [`Gateway::send`], aborting with `Cancelled` once `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, GatewayError> {
        let span = info_span!(
            "gateway_send",
            request_id = %Uuid::new_v4(),
            method = %descriptor.method,
            path = %descriptor.path,
        );
        self.run(&descriptor, cancel).instrument(span).await
    }

    /// Fetch a fresh CSRF token from the bootstrap endpoint.
    ///
    /// Returns whatever the credential store holds afterwards. Bootstrap
    /// failures are logged, not returned; only cancellation is an error.
    pub async fn refresh_csrf(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, GatewayError> {
        let request = OutboundRequest {
            method: Method::GET,
            url: self.url_for(&self.config.csrf_path)?,
            headers: HeaderMap::new(),
            body: None,
        };

        match self.transmit(request, cancel).await {
            Ok(response) if response.status.is_success() => {
                let issued = csrf_from_set_cookie(&response.headers, &self.config.csrf_cookie)
                    .or_else(|| csrf_from_body(&response.body));
                if let Some(token) = issued {
                    self.store.set_csrf_token(Some(&token));
                }
                debug!("CSRF bootstrap completed");
            }
            Ok(response) => {
                warn!(
                    status = response.status.as_u16(),
                    "CSRF bootstrap rejected, continuing with stored token"
                );
            }
            Err(TransmitFailure::Cancelled) => return Err(GatewayError::Cancelled),
            Err(TransmitFailure::Network(reason)) => {
                warn!(error = %reason, "CSRF bootstrap failed, continuing with stored token");
            }
        }

        Ok(self.store.csrf_token())
    }

    async fn run(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, GatewayError> {
        let csrf_protected = self.config.strategy.uses_csrf() && descriptor.is_state_changing();
        let url = self.url_for(&descriptor.path)?;
        let body = descriptor
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| GatewayError::InvalidRequest(format!("body is not serializable: {e}")))?;

        let mut state = AttemptState::Unsent;
        loop {
            state = match state {
                AttemptState::Unsent => {
                    let csrf = if csrf_protected {
                        self.current_csrf(cancel).await?
                    } else {
                        None
                    };
                    AttemptState::FirstAttempt { csrf }
                }
                AttemptState::FirstAttempt { csrf } => {
                    let request = self.outbound(descriptor, &url, body.clone(), csrf.as_deref())?;
                    match self.transmit(request, cancel).await {
                        Ok(response) => first_attempt_outcome(response, csrf_protected),
                        Err(TransmitFailure::Cancelled) => {
                            AttemptState::Failed(GatewayError::Cancelled)
                        }
                        Err(TransmitFailure::Network(reason)) => {
                            warn!(error = %reason, "Request failed without a response");
                            AttemptState::Failed(GatewayError::NetworkError(reason))
                        }
                    }
                }
                AttemptState::NeedsCsrfRefresh => {
                    info!("Request forbidden, refreshing CSRF token and retrying once");
                    let csrf = self.refresh_csrf(cancel).await?;
                    AttemptState::SecondAttempt { csrf }
                }
                AttemptState::SecondAttempt { csrf } => {
                    let request = self.outbound(descriptor, &url, body.clone(), csrf.as_deref())?;
                    match self.transmit(request, cancel).await {
                        Ok(response) if response.status.is_success() => {
                            info!("Request succeeded after CSRF refresh");
                            success(response, true)
                        }
                        Ok(response) => {
                            warn!(
                                status = response.status.as_u16(),
                                "Retry after CSRF refresh rejected, session expired"
                            );
                            AttemptState::Failed(GatewayError::AuthExpired)
                        }
                        Err(TransmitFailure::Cancelled) => {
                            AttemptState::Failed(GatewayError::Cancelled)
                        }
                        Err(TransmitFailure::Network(reason)) => {
                            warn!(error = %reason, "Retry after CSRF refresh failed, session expired");
                            AttemptState::Failed(GatewayError::AuthExpired)
                        }
                    }
                }
                AttemptState::Success(response) => return Ok(response),
                AttemptState::Failed(error) => return Err(error),
            };
        }
    }

    async fn current_csrf(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, GatewayError> {
        match self.store.csrf_token() {
            Some(token) => Ok(Some(token)),
            None => {
                debug!("No CSRF token stored, bootstrapping");
                self.refresh_csrf(cancel).await
            }
        }
    }

    fn outbound(
        &self,
        descriptor: &RequestDescriptor,
        url: &Url,
        body: Option<Vec<u8>>,
        csrf: Option<&str>,
    ) -> Result<OutboundRequest, GatewayError> {
        let mut headers = descriptor.headers.clone();

        if let Some(token) = self.store.bearer_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                GatewayError::InvalidRequest("stored bearer token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(token) = csrf.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(token).map_err(|_| {
                GatewayError::InvalidRequest("stored CSRF token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(self.config.csrf_header.clone(), value);
        }

        Ok(OutboundRequest {
            method: descriptor.method.clone(),
            url: url.clone(),
            headers,
            body,
        })
    }

    async fn transmit(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransmitFailure> {
        let timeout = self.config.attempt_timeout;
        let attempt = tokio::time::timeout(timeout, self.transport.execute(request));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request cancelled by caller");
                Err(TransmitFailure::Cancelled)
            }
            result = attempt => match result {
                Ok(Ok(response)) => {
                    debug!(status = response.status.as_u16(), "Response received");
                    Ok(response)
                }
                Ok(Err(e)) => Err(TransmitFailure::Network(e.to_string())),
                Err(_) => Err(TransmitFailure::Network(format!(
                    "no response within {} ms",
                    timeout.as_millis()
                ))),
            },
        }
    }
}

fn first_attempt_outcome(response: TransportResponse, csrf_protected: bool) -> AttemptState {
    match response.status {
        status if status.is_success() => success(response, false),
        status if status == StatusCode::UNAUTHORIZED => {
            warn!("Request unauthorized, session expired");
            AttemptState::Failed(GatewayError::AuthExpired)
        }
        status if status == StatusCode::FORBIDDEN && csrf_protected => {
            AttemptState::NeedsCsrfRefresh
        }
        status => {
            let message = extract_message(&response.body);
            warn!(status = status.as_u16(), message = ?message, "Request rejected");
            AttemptState::Failed(GatewayError::RemoteRejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn success(response: TransportResponse, csrf_refreshed: bool) -> AttemptState {
    match decode_body(&response.body) {
        Ok(payload) => AttemptState::Success(GatewayResponse {
            status: response.status,
            payload,
            csrf_refreshed,
        }),
        Err(error) => AttemptState::Failed(error),
    }
}

/// CSRF token from a `Set-Cookie: {cookie}=...` response header.
fn csrf_from_set_cookie(headers: &HeaderMap, cookie: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// CSRF token from a `{ "token": .. }` bootstrap body.
fn csrf_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
