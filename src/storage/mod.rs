// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Persistent client-side state, the on-disk counterpart of a browser's
//! `localStorage`. Everything lives under a single data directory:
//!
//! ```text
//! {data_dir}/
//!   token.json        # Bearer token (string)
//!   likedBlogs.json   # Liked post ids, oldest first (array)
//!   cookies.json      # Cookie jar snapshot for the API origin (array)
//! ```

pub mod local;

pub use local::{LocalStorage, StorageError, StorageResult};

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the liked post ids.
pub const LIKED_BLOGS_KEY: &str = "likedBlogs";

/// Key holding the cookie jar snapshot.
pub const COOKIES_KEY: &str = "cookies";
