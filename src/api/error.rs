// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Failure of a typed [`BlogApi`](super::BlogApi) call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Rejected locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// 2xx response whose envelope reports `success: false`.
    #[error("{}", .message.as_deref().unwrap_or(crate::gateway::GENERIC_FAILURE_MESSAGE))]
    Unsuccessful { message: Option<String> },

    /// Login answered 2xx but carried no token.
    #[error("no token received")]
    MissingToken,

    #[error("failed to update local credentials: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::Gateway(e) if e.is_auth_expired())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Gateway(GatewayError::Cancelled))
    }

    /// Text suitable for showing to a user.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Gateway(e) => e.display_message(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
