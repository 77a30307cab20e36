// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the client. Configuration is loaded from the environment once
//! and passed down explicitly; nothing reads the environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BLOG_API_URL` | Base URL of the blog backend | `http://localhost:8080` |
//! | `BLOG_CSRF_PATH` | CSRF issuance endpoint | `/api/csrf` |
//! | `BLOG_LOGOUT_PATH` | Session invalidation endpoint | `/logout` |
//! | `BLOG_CSRF_COOKIE` | Cookie carrying the CSRF token | `XSRF-TOKEN` |
//! | `BLOG_CSRF_HEADER` | Header echoing the CSRF token | `X-XSRF-TOKEN` |
//! | `BLOG_SESSION_STRATEGY` | `bearer`, `cookie` or `cookie-csrf` | `cookie-csrf` |
//! | `BLOG_DATA_DIR` | Directory for local client state | `.blog-client` |
//! | `BLOG_TIMEOUT_SECS` | Per-attempt request timeout | `15` |
//! | `BLOG_LIKED_CAPACITY` | Max remembered liked posts | `500` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `blog_client=info` |

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderName;
use url::Url;

use crate::session::SessionStrategy;

pub const API_URL_ENV: &str = "BLOG_API_URL";
pub const CSRF_PATH_ENV: &str = "BLOG_CSRF_PATH";
pub const LOGOUT_PATH_ENV: &str = "BLOG_LOGOUT_PATH";
pub const CSRF_COOKIE_ENV: &str = "BLOG_CSRF_COOKIE";
pub const CSRF_HEADER_ENV: &str = "BLOG_CSRF_HEADER";
pub const SESSION_STRATEGY_ENV: &str = "BLOG_SESSION_STRATEGY";
pub const DATA_DIR_ENV: &str = "BLOG_DATA_DIR";
pub const TIMEOUT_SECS_ENV: &str = "BLOG_TIMEOUT_SECS";
pub const LIKED_CAPACITY_ENV: &str = "BLOG_LIKED_CAPACITY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_CSRF_PATH: &str = "/api/csrf";
pub const DEFAULT_LOGOUT_PATH: &str = "/logout";
pub const DEFAULT_CSRF_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_CSRF_HEADER: &str = "X-XSRF-TOKEN";
pub const DEFAULT_DATA_DIR: &str = ".blog-client";
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_LIKED_CAPACITY: usize = 500;

/// OAuth entry point the browser is sent to for GitHub login.
pub const GITHUB_AUTHORIZATION_PATH: &str = "/oauth2/authorization/github";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} is not a valid HTTP header name: {value}")]
    InvalidHeader { name: &'static str, value: String },

    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error(transparent)]
    InvalidStrategy(#[from] crate::session::UnknownStrategy),
}

/// Settings the gateway is constructed with.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL every request path is resolved against.
    pub base_url: Url,
    /// Path of the CSRF bootstrap endpoint.
    pub csrf_path: String,
    /// Cookie the backend issues the CSRF token in.
    pub csrf_cookie: String,
    /// Header the CSRF token is echoed in.
    pub csrf_header: HeaderName,
    pub strategy: SessionStrategy,
    /// Timeout applied to each transmission, bootstrap included.
    pub attempt_timeout: Duration,
}

impl GatewayConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            csrf_path: DEFAULT_CSRF_PATH.to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: HeaderName::from_static("x-xsrf-token"),
            strategy: SessionStrategy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_strategy(mut self, strategy: SessionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub csrf_path: String,
    pub logout_path: String,
    pub csrf_cookie: String,
    pub csrf_header: HeaderName,
    pub strategy: SessionStrategy,
    pub data_dir: PathBuf,
    pub attempt_timeout: Duration,
    pub liked_capacity: usize,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| -> String {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_url = parse_base_url(&var(API_URL_ENV, DEFAULT_API_URL))
            .map_err(|reason| ConfigError::InvalidUrl {
                name: API_URL_ENV,
                reason,
            })?;

        let header_value = var(CSRF_HEADER_ENV, DEFAULT_CSRF_HEADER);
        let csrf_header = HeaderName::from_bytes(header_value.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader {
                name: CSRF_HEADER_ENV,
                value: header_value.clone(),
            }
        })?;

        let strategy = var(SESSION_STRATEGY_ENV, SessionStrategy::default().as_str()).parse()?;

        let timeout_secs = parse_positive(TIMEOUT_SECS_ENV, &var(TIMEOUT_SECS_ENV, "15"))?;
        let liked_capacity = parse_positive(
            LIKED_CAPACITY_ENV,
            &var(LIKED_CAPACITY_ENV, &DEFAULT_LIKED_CAPACITY.to_string()),
        )?;

        Ok(Self {
            api_url,
            csrf_path: normalize_path(&var(CSRF_PATH_ENV, DEFAULT_CSRF_PATH)),
            logout_path: normalize_path(&var(LOGOUT_PATH_ENV, DEFAULT_LOGOUT_PATH)),
            csrf_cookie: var(CSRF_COOKIE_ENV, DEFAULT_CSRF_COOKIE),
            csrf_header,
            strategy,
            data_dir: PathBuf::from(var(DATA_DIR_ENV, DEFAULT_DATA_DIR)),
            attempt_timeout: Duration::from_secs(timeout_secs as u64),
            liked_capacity,
        })
    }

    /// Override the API base URL (e.g. from a command-line flag).
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_base_url(raw).map_err(|reason| ConfigError::InvalidUrl {
            name: API_URL_ENV,
            reason,
        })?;
        Ok(self)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_strategy(mut self, strategy: SessionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The subset of settings the gateway needs.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.api_url.clone(),
            csrf_path: self.csrf_path.clone(),
            csrf_cookie: self.csrf_cookie.clone(),
            csrf_header: self.csrf_header.clone(),
            strategy: self.strategy,
            attempt_timeout: self.attempt_timeout,
        }
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the
/// full base path.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}
