// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded set of liked post ids.
//!
//! Likes are purely local. The set is an LRU capped at a configurable size;
//! liking one more post than the cap forgets the least recently liked one.
//! Every change is flushed to local storage under `likedBlogs` as a JSON
//! array, oldest first. The in-memory set only changes once that write has
//! succeeded.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

use crate::models::BlogId;
use crate::storage::{LocalStorage, StorageResult, LIKED_BLOGS_KEY};

pub struct LikedBlogs {
    storage: LocalStorage,
    cache: Mutex<LruCache<BlogId, ()>>,
}

impl LikedBlogs {
    /// Load the persisted set. A capacity of zero is treated as one.
    pub fn load(storage: LocalStorage, capacity: usize) -> StorageResult<Self> {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let mut cache = LruCache::new(capacity);

        let stored: Vec<BlogId> = storage.get(LIKED_BLOGS_KEY)?.unwrap_or_default();
        for id in stored {
            cache.push(id, ());
        }
        debug!(count = cache.len(), "Loaded liked blogs");

        Ok(Self {
            storage,
            cache: Mutex::new(cache),
        })
    }

    /// Like `id`, or unlike it if already liked. Returns whether `id` is
    /// liked afterwards.
    pub fn toggle(&self, id: BlogId) -> StorageResult<bool> {
        let mut cache = self.lock();
        let liked = !cache.contains(&id);

        let mut ordering = oldest_first(&cache);
        if liked {
            ordering.push(id);
            if ordering.len() > cache.cap().get() {
                ordering.remove(0);
            }
        } else {
            ordering.retain(|other| *other != id);
        }
        self.flush(&ordering)?;

        if liked {
            if let Some((evicted, _)) = cache.push(id, ()) {
                debug!(blog_id = evicted, "Liked blogs full, forgot oldest like");
            }
        } else {
            cache.pop(&id);
        }
        Ok(liked)
    }

    pub fn is_liked(&self, id: BlogId) -> bool {
        self.lock().contains(&id)
    }

    /// Liked ids, most recently liked first.
    pub fn ids(&self) -> Vec<BlogId> {
        self.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) -> StorageResult<()> {
        let mut cache = self.lock();
        self.flush(&[])?;
        cache.clear();
        Ok(())
    }

    fn flush(&self, oldest_first: &[BlogId]) -> StorageResult<()> {
        self.storage.set(LIKED_BLOGS_KEY, oldest_first)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<BlogId, ()>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn oldest_first(cache: &LruCache<BlogId, ()>) -> Vec<BlogId> {
    cache.iter().rev().map(|(id, _)| *id).collect()
}
