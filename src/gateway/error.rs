// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway error taxonomy.

use serde_json::Value;

/// Shown when the backend rejects a request without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed. Please try again.";

/// Classified outcome of a failed `Gateway::send`.
///
/// The gateway only classifies; deciding what the user sees is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Session invalid, even after one CSRF refresh. Log in again.
    #[error("session expired, please log in again")]
    AuthExpired,

    /// No response received (connection failure, DNS, timeout).
    #[error("network error: {0}")]
    NetworkError(String),

    /// Any other non-2xx response.
    #[error("request rejected with HTTP {status}: {}", display_or_generic(.message))]
    RemoteRejected {
        status: u16,
        message: Option<String>,
    },

    /// The caller cancelled the request while it was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be built (bad path, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A 2xx response whose body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Text suitable for showing to a user.
    pub fn display_message(&self) -> String {
        match self {
            GatewayError::RemoteRejected { message, .. } => display_or_generic(message).to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status attached to the error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, GatewayError::AuthExpired)
    }
}

fn display_or_generic(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE)
}

/// Pull a human-readable reason out of an error body.
///
/// The backend answers `{ "success": false, "message": ".." }`; some
/// framework-level errors use `error` instead.
pub fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}
