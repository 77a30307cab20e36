// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::BlogApi;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::{Gateway, HttpTransport};
use crate::likes::LikedBlogs;
use crate::session::PersistentCredentialStore;
use crate::storage::LocalStorage;

/// Everything a front end needs, wired from one [`ClientConfig`].
#[derive(Clone)]
pub struct ClientState {
    pub config: ClientConfig,
    pub store: Arc<PersistentCredentialStore>,
    pub api: BlogApi,
    pub likes: Arc<LikedBlogs>,
}

impl ClientState {
    /// Open local storage, restore the previous cookie jar and build the
    /// HTTP stack on top of it.
    pub fn open(config: ClientConfig) -> ClientResult<Self> {
        let storage = LocalStorage::open(&config.data_dir)?;

        let store = Arc::new(PersistentCredentialStore::new(
            storage.clone(),
            config.strategy,
            config.api_url.clone(),
            config.csrf_cookie.clone(),
        ));
        store.restore_cookies()?;

        let transport = HttpTransport::with_jar(store.jar())?;
        let gateway = Gateway::new(config.gateway_config(), Arc::new(transport), store.clone());
        let api = BlogApi::new(gateway).with_logout_path(config.logout_path.clone());
        let likes = Arc::new(LikedBlogs::load(storage, config.liked_capacity)?);

        debug!(
            api_url = %config.api_url,
            strategy = %config.strategy,
            data_dir = %config.data_dir.display(),
            "Client state ready"
        );

        Ok(Self {
            config,
            store,
            api,
            likes,
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.api = self.api.with_cancellation(cancel);
        self
    }

    /// Snapshot the cookie jar so the next run resumes the session.
    pub fn persist(&self) -> ClientResult<()> {
        self.store.save_cookies()?;
        Ok(())
    }
}
