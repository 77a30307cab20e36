// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::gateway::{GatewayError, TransportError};
use crate::storage::StorageError;

/// Top-level error for the client and the `blogctl` binary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP client error: {0}")]
    Transport(#[from] TransportError),
}

impl From<GatewayError> for ClientError {
    fn from(e: GatewayError) -> Self {
        ClientError::Api(ApiError::Gateway(e))
    }
}

impl ClientError {
    /// Session expired; the user should log in again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_auth_expired())
    }

    /// Text suitable for showing to a user.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Api(e) => e.display_message(),
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
