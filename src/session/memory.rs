// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential store.

use std::sync::RwLock;

use super::{non_empty, CredentialStore, SessionCredentials};
use crate::storage::StorageResult;

/// Credentials held in process memory only. Lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<SessionCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given tokens.
    pub fn with_tokens(bearer: Option<&str>, csrf: Option<&str>) -> Self {
        Self {
            inner: RwLock::new(SessionCredentials {
                bearer_token: non_empty(bearer),
                csrf_token: non_empty(csrf),
            }),
        }
    }

    fn read(&self) -> SessionCredentials {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut SessionCredentials)) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn bearer_token(&self) -> Option<String> {
        self.read().bearer_token
    }

    fn csrf_token(&self) -> Option<String> {
        self.read().csrf_token
    }

    fn set_bearer_token(&self, token: Option<&str>) -> StorageResult<()> {
        let token = non_empty(token);
        self.update(|creds| creds.bearer_token = token);
        Ok(())
    }

    fn set_csrf_token(&self, token: Option<&str>) {
        let token = non_empty(token);
        self.update(|creds| creds.csrf_token = token);
    }

    fn clear(&self) -> StorageResult<()> {
        self.update(|creds| *creds = SessionCredentials::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.snapshot(), SessionCredentials::default());
    }

    #[test]
    fn set_and_clear() {
        let store = MemoryCredentialStore::new();
        store.set_bearer_token(Some("bearer-1")).unwrap();
        store.set_csrf_token(Some("csrf-1"));
        assert_eq!(store.bearer_token().as_deref(), Some("bearer-1"));
        assert_eq!(store.csrf_token().as_deref(), Some("csrf-1"));

        store.clear().unwrap();
        assert!(store.bearer_token().is_none());
        assert!(store.csrf_token().is_none());
    }

    #[test]
    fn blank_tokens_are_absent() {
        let store = MemoryCredentialStore::with_tokens(Some(""), Some("   "));
        assert!(store.bearer_token().is_none());
        assert!(store.csrf_token().is_none());
    }
}
