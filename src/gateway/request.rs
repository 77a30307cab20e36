// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request descriptors and decoded responses.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::GatewayError;

/// Methods that change server state and therefore need CSRF protection.
pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

/// What the caller wants sent. The gateway only adds the `Authorization`
/// and CSRF headers.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, GatewayError> {
        let value = serde_json::to_value(body)
            .map_err(|e| GatewayError::InvalidRequest(format!("body is not serializable: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_state_changing(&self) -> bool {
        is_state_changing(&self.method)
    }
}

/// Successful result of `Gateway::send`.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    /// Decoded JSON body; `Null` for empty bodies.
    pub payload: Value,
    /// The first attempt hit a stale CSRF token and succeeded only after a
    /// silent refresh. Advisory: callers may tell the user.
    pub csrf_refreshed: bool,
}

impl GatewayResponse {
    /// Deserialize the payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        serde_json::from_value(self.payload)
            .map_err(|e| GatewayError::InvalidResponse(format!("unexpected payload shape: {e}")))
    }
}

/// Decode a response body, treating an empty body as `null`.
pub(crate) fn decode_body(body: &[u8]) -> Result<Value, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("body is not JSON: {e}")))
}
