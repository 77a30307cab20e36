// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Where the gateway gets its credentials from.
//!
//! ## Strategies
//!
//! | Strategy | Bearer token | Cookie jar | CSRF header |
//! |----------|--------------|------------|-------------|
//! | `BearerOnly` | local storage `token` | no | never |
//! | `CookieSession` | local storage + `jwt` cookie | yes | never |
//! | `CookieSessionWithCsrf` | local storage + `jwt` cookie | yes | state-changing calls |
//!
//! The strategy is picked once, at configuration time.
//!
//! ## Credential Store
//!
//! `CredentialStore` is read/write only. The gateway reads it fresh on every
//! call and never keeps a copy of either token between calls.

pub mod memory;
pub mod persistent;

use std::fmt;
use std::str::FromStr;

use crate::storage::StorageResult;

pub use memory::MemoryCredentialStore;
pub use persistent::PersistentCredentialStore;

/// Cookie the bearer token is mirrored into for cookie-based strategies.
pub const JWT_COOKIE: &str = "jwt";

/// How the client authenticates against the blog backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStrategy {
    /// Bearer token only, no cookies, no CSRF.
    BearerOnly,
    /// Cookie jar attached to every request, no CSRF.
    CookieSession,
    /// Cookie jar plus CSRF token echo on state-changing calls.
    #[default]
    CookieSessionWithCsrf,
}

impl SessionStrategy {
    /// Whether requests carry a cookie jar.
    pub fn uses_cookies(self) -> bool {
        !matches!(self, SessionStrategy::BearerOnly)
    }

    /// Whether state-changing requests are CSRF protected.
    pub fn uses_csrf(self) -> bool {
        matches!(self, SessionStrategy::CookieSessionWithCsrf)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStrategy::BearerOnly => "bearer",
            SessionStrategy::CookieSession => "cookie",
            SessionStrategy::CookieSessionWithCsrf => "cookie-csrf",
        }
    }
}

impl fmt::Display for SessionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session strategy '{0}' (expected bearer, cookie or cookie-csrf)")]
pub struct UnknownStrategy(pub String);

impl FromStr for SessionStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "bearer-only" => Ok(SessionStrategy::BearerOnly),
            "cookie" | "cookie-session" => Ok(SessionStrategy::CookieSession),
            "cookie-csrf" | "csrf" | "cookie-session-with-csrf" => {
                Ok(SessionStrategy::CookieSessionWithCsrf)
            }
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Point-in-time view of the stored credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub bearer_token: Option<String>,
    pub csrf_token: Option<String>,
}

/// Read/write access to the session credentials.
///
/// Implementations must be cheap to read; the gateway calls the getters on
/// every request. Empty strings are reported as `None`.
pub trait CredentialStore: Send + Sync {
    /// Current bearer token, if any.
    fn bearer_token(&self) -> Option<String>;

    /// Current CSRF token, if any.
    fn csrf_token(&self) -> Option<String>;

    /// Replace (or remove, with `None`) the bearer token.
    fn set_bearer_token(&self, token: Option<&str>) -> StorageResult<()>;

    /// Replace (or remove, with `None`) the CSRF token.
    fn set_csrf_token(&self, token: Option<&str>);

    /// Drop every credential.
    fn clear(&self) -> StorageResult<()>;

    fn snapshot(&self) -> SessionCredentials {
        SessionCredentials {
            bearer_token: self.bearer_token(),
            csrf_token: self.csrf_token(),
        }
    }
}

/// `Some(value)` unless the value is blank.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
