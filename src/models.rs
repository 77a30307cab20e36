// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Blog API Data Models
//!
//! Request and response bodies exchanged with the blog backend.
//!
//! ## Envelope
//!
//! Every JSON response from the backend is wrapped in [`ApiEnvelope`]:
//!
//! ```text
//! { "success": true, "message": "Blog created successfully", "data": { .. } }
//! { "success": true, "data": [ .. ], "count": 3 }
//! { "success": false, "message": "Blog not found" }
//! ```
//!
//! Login is the exception: the token sits at the top level next to
//! `success` (see [`LoginResponse`]).

use serde::{Deserialize, Serialize};

/// Server-assigned post identifier.
pub type BlogId = i64;

// =============================================================================
// Blogs
// =============================================================================

/// A published post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub content: String,
    /// Author, when the backend records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Body for creating or updating a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
}

impl BlogDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Mirrors the backend's 400 checks so bad drafts never leave the client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Blog title is required");
        }
        if self.content.trim().is_empty() {
            return Err("Blog content is required");
        }
        Ok(())
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Body for `/auth/signup` and `/auth/login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keeps passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from `/auth/login`.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("success", &self.success)
            .field("message", &self.message)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// The authenticated user as reported by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub username: Option<String>,
    pub role: Option<String>,
    pub message: Option<String>,
}

// =============================================================================
// Envelope
// =============================================================================

/// Standard backend response wrapper.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    /// Absent on bodies that are not enveloped; treated as success.
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub count: Option<usize>,
}

fn default_success() -> bool {
    true
}

/// Response from `/health`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blog_list_envelope_deserializes() {
        let envelope: ApiEnvelope<Vec<Blog>> = serde_json::from_value(json!({
            "success": true,
            "data": [
                {"id": 1, "title": "First", "content": "Hello", "username": "ada"},
                {"id": 2, "title": "Second", "content": "World"}
            ],
            "count": 2
        }))
        .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.count, Some(2));
        let blogs = envelope.data.unwrap();
        assert_eq!(blogs[0].username.as_deref(), Some("ada"));
        assert_eq!(blogs[1].username, None);
    }

    #[test]
    fn failure_envelope_has_no_data() {
        let envelope: ApiEnvelope<Blog> = serde_json::from_value(json!({
            "success": false,
            "message": "Blog not found"
        }))
        .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Blog not found"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn draft_validation_matches_backend_checks() {
        assert!(BlogDraft::new("T", "C").validate().is_ok());
        assert_eq!(
            BlogDraft::new("  ", "C").validate(),
            Err("Blog title is required")
        );
        assert_eq!(
            BlogDraft::new("T", "\n").validate(),
            Err("Blog content is required")
        );
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let creds = Credentials::new("ada", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));

        let login = LoginResponse {
            token: Some("eyJhbGciOi".to_string()),
            ..Default::default()
        };
        assert!(!format!("{login:?}").contains("eyJhbGciOi"));
    }

    #[test]
    fn blog_serialization_omits_missing_username() {
        let blog = Blog {
            id: 3,
            title: "T".into(),
            content: "C".into(),
            username: None,
        };
        assert_eq!(
            serde_json::to_value(&blog).unwrap(),
            json!({"id": 3, "title": "T", "content": "C"})
        );
    }
}
