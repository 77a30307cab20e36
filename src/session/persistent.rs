// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store backed by local storage and a cookie jar.
//!
//! - The bearer token lives in local storage under `token`. Cookie strategies
//!   also mirror it into the `jwt` cookie.
//! - The CSRF token is whatever the jar holds under the configured cookie
//!   name (`XSRF-TOKEN` by default). The jar is shared with the HTTP client,
//!   so `Set-Cookie` from the CSRF endpoint lands here without any help.
//! - Between process runs the jar is snapshotted to local storage under
//!   `cookies`.

use std::sync::{Arc, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, warn};
use url::Url;

use super::{non_empty, CredentialStore, SessionStrategy, JWT_COOKIE};
use crate::storage::{LocalStorage, StorageResult, COOKIES_KEY, TOKEN_KEY};

pub struct PersistentCredentialStore {
    storage: LocalStorage,
    strategy: SessionStrategy,
    origin: Url,
    csrf_cookie: String,
    jar: Option<Arc<Jar>>,
    /// CSRF token for stores without a jar.
    csrf_fallback: RwLock<Option<String>>,
}

impl PersistentCredentialStore {
    /// Create a store for the API at `origin`.
    ///
    /// A cookie jar is created only when the strategy uses cookies.
    pub fn new(
        storage: LocalStorage,
        strategy: SessionStrategy,
        origin: Url,
        csrf_cookie: impl Into<String>,
    ) -> Self {
        let jar = strategy.uses_cookies().then(|| Arc::new(Jar::default()));
        Self {
            storage,
            strategy,
            origin,
            csrf_cookie: csrf_cookie.into(),
            jar,
            csrf_fallback: RwLock::new(None),
        }
    }

    /// Cookie jar to hand to the HTTP client.
    pub fn jar(&self) -> Option<Arc<Jar>> {
        self.jar.clone()
    }

    pub fn strategy(&self) -> SessionStrategy {
        self.strategy
    }

    /// Value of the cookie `name` for the API origin.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookie_pairs()
            .into_iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| non_empty(Some(&v)))
    }

    /// Load the cookie snapshot written by [`Self::save_cookies`].
    pub fn restore_cookies(&self) -> StorageResult<usize> {
        let Some(jar) = &self.jar else {
            return Ok(0);
        };
        let pairs: Vec<String> = self.storage.get(COOKIES_KEY)?.unwrap_or_default();
        for pair in &pairs {
            jar.add_cookie_str(&format!("{pair}; Path=/"), &self.origin);
        }
        debug!(count = pairs.len(), "Restored cookie snapshot");
        Ok(pairs.len())
    }

    /// Snapshot the cookies for the API origin into local storage.
    pub fn save_cookies(&self) -> StorageResult<()> {
        if self.jar.is_none() {
            return Ok(());
        }
        let pairs: Vec<String> = self
            .cookie_pairs()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if pairs.is_empty() {
            self.storage.remove(COOKIES_KEY)
        } else {
            self.storage.set(COOKIES_KEY, &pairs)
        }
    }

    fn cookie_pairs(&self) -> Vec<(String, String)> {
        let Some(header) = self.jar.as_ref().and_then(|jar| jar.cookies(&self.origin)) else {
            return Vec::new();
        };
        let Ok(header) = header.to_str() else {
            return Vec::new();
        };
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    fn put_cookie(&self, name: &str, value: Option<&str>) {
        let Some(jar) = &self.jar else {
            return;
        };
        let cookie = match value {
            Some(value) => format!("{name}={value}; Path=/; SameSite=Lax"),
            None => format!("{name}=; Path=/; Max-Age=0"),
        };
        jar.add_cookie_str(&cookie, &self.origin);
    }
}

impl CredentialStore for PersistentCredentialStore {
    fn bearer_token(&self) -> Option<String> {
        match self.storage.get::<String>(TOKEN_KEY) {
            Ok(token) => non_empty(token.as_deref()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored bearer token");
                None
            }
        }
    }

    fn csrf_token(&self) -> Option<String> {
        if self.jar.is_some() {
            return self.cookie(&self.csrf_cookie);
        }
        self.csrf_fallback
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_bearer_token(&self, token: Option<&str>) -> StorageResult<()> {
        let token = non_empty(token);
        match &token {
            Some(token) => self.storage.set(TOKEN_KEY, token)?,
            None => self.storage.remove(TOKEN_KEY)?,
        }
        self.put_cookie(JWT_COOKIE, token.as_deref());
        Ok(())
    }

    fn set_csrf_token(&self, token: Option<&str>) {
        let token = non_empty(token);
        if self.jar.is_some() {
            self.put_cookie(&self.csrf_cookie, token.as_deref());
        } else {
            *self
                .csrf_fallback
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
        }
    }

    fn clear(&self) -> StorageResult<()> {
        self.set_bearer_token(None)?;
        self.set_csrf_token(None);
        for (name, _) in self.cookie_pairs() {
            self.put_cookie(&name, None);
        }
        self.storage.remove(COOKIES_KEY)
    }
}
