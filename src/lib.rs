// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blog Client - authenticated HTTP client for the blog backend
//!
//! Every backend call flows through a single gateway that attaches the
//! bearer token, handles CSRF protection and recovers once from a stale
//! CSRF token.
//!
//! ## Modules
//!
//! - `gateway` - Authenticated request gateway and HTTP transport
//! - `session` - Session strategies and credential stores
//! - `api` - Typed blog API (auth and posts)
//! - `likes` - Bounded set of liked posts
//! - `storage` - Local JSON key/value storage
//! - `config` - Environment configuration

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod likes;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
