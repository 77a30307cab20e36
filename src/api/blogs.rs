// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blog CRUD.

use tracing::info;

use super::{require_data, unwrap_envelope, ApiError, ApiResult, BlogApi};
use crate::gateway::RequestDescriptor;
use crate::models::{Blog, BlogDraft, BlogId};

fn blog_path(id: BlogId) -> String {
    format!("/blogs/{id}")
}

impl BlogApi {
    pub async fn list_blogs(&self) -> ApiResult<Vec<Blog>> {
        let response = self.send(RequestDescriptor::get("/blogs")).await?;
        Ok(unwrap_envelope(response)?.data.unwrap_or_default())
    }

    pub async fn get_blog(&self, id: BlogId) -> ApiResult<Blog> {
        let response = self.send(RequestDescriptor::get(blog_path(id))).await?;
        require_data(unwrap_envelope(response)?)
    }

    pub async fn create_blog(&self, draft: &BlogDraft) -> ApiResult<Blog> {
        draft.validate().map_err(|e| ApiError::Validation(e.into()))?;

        let descriptor = RequestDescriptor::post("/blogs").json(draft)?;
        let blog: Blog = require_data(unwrap_envelope(self.send(descriptor).await?)?)?;

        info!(blog_id = blog.id, "Blog created");
        Ok(blog)
    }

    pub async fn update_blog(&self, id: BlogId, draft: &BlogDraft) -> ApiResult<Blog> {
        draft.validate().map_err(|e| ApiError::Validation(e.into()))?;

        let descriptor = RequestDescriptor::put(blog_path(id)).json(draft)?;
        let blog: Blog = require_data(unwrap_envelope(self.send(descriptor).await?)?)?;

        info!(blog_id = id, "Blog updated");
        Ok(blog)
    }

    pub async fn delete_blog(&self, id: BlogId) -> ApiResult<()> {
        let response = self.send(RequestDescriptor::delete(blog_path(id))).await?;
        unwrap_envelope::<serde_json::Value>(response)?;

        info!(blog_id = id, "Blog deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::api_with;
    use super::*;
    use crate::gateway::testing::Reply;
    use crate::gateway::GatewayError;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn list_unwraps_envelope() {
        let (api, transport, _) = api_with(Some("jwt"), None);
        transport.on(
            Method::GET,
            "/blogs",
            Reply::Json(
                200,
                json!({
                    "success": true,
                    "data": [{"id": 1, "title": "A", "content": "a"}, {"id": 2, "title": "B", "content": "b"}],
                    "count": 2
                }),
            ),
        );

        let blogs = api.list_blogs().await.unwrap();
        assert_eq!(blogs.len(), 2);
        assert_eq!(blogs[1].title, "B");
        assert_eq!(transport.count(&Method::GET, "/api/csrf"), 0);
    }

    #[tokio::test]
    async fn get_missing_blog_is_remote_rejected() {
        let (api, transport, _) = api_with(Some("jwt"), None);
        transport.on(
            Method::GET,
            "/blogs/42",
            Reply::Json(404, json!({"success": false, "message": "Blog not found"})),
        );

        let err = api.get_blog(42).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Gateway(GatewayError::RemoteRejected { status: 404, .. })
        ));
        assert_eq!(err.display_message(), "Blog not found");
    }

    #[tokio::test]
    async fn create_bootstraps_csrf_and_returns_created_blog() {
        let (api, transport, _) = api_with(Some("jwt"), None);
        transport
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "issued"))
            .on(
                Method::POST,
                "/blogs",
                Reply::Json(
                    201,
                    json!({
                        "success": true,
                        "message": "Blog created successfully",
                        "data": {"id": 1, "title": "T", "content": "C"}
                    }),
                ),
            );

        let blog = api.create_blog(&BlogDraft::new("T", "C")).await.unwrap();
        assert_eq!(blog.id, 1);
        assert_eq!(blog.title, "T");

        let sent = transport.requests_to(&Method::POST, "/blogs");
        assert_eq!(sent[0].header("x-xsrf-token"), Some("issued"));
        assert_eq!(sent[0].header("authorization"), Some("Bearer jwt"));
    }

    #[tokio::test]
    async fn blank_draft_is_rejected_locally() {
        let (api, transport, _) = api_with(Some("jwt"), Some("csrf"));

        let err = api.create_blog(&BlogDraft::new(" ", "C")).await.unwrap_err();
        assert_eq!(err.to_string(), "Blog title is required");

        let err = api.update_blog(3, &BlogDraft::new("T", "")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn update_retries_once_after_stale_csrf() {
        let (api, transport, _) = api_with(Some("jwt"), Some("stale"));
        transport
            .on(Method::PUT, "/blogs/3", Reply::Status(403))
            .on(
                Method::PUT,
                "/blogs/3",
                Reply::Json(
                    200,
                    json!({"success": true, "data": {"id": 3, "title": "T2", "content": "C2"}}),
                ),
            )
            .on(Method::GET, "/api/csrf", Reply::SetCookie("XSRF-TOKEN", "fresh"));

        let blog = api.update_blog(3, &BlogDraft::new("T2", "C2")).await.unwrap();
        assert_eq!(blog.title, "T2");
        assert_eq!(transport.count(&Method::PUT, "/blogs/3"), 2);
    }

    #[tokio::test]
    async fn delete_accepts_message_only_envelope() {
        let (api, transport, _) = api_with(Some("jwt"), Some("csrf"));
        transport.on(
            Method::DELETE,
            "/blogs/5",
            Reply::Json(200, json!({"success": true, "message": "Blog deleted successfully"})),
        );

        api.delete_blog(5).await.unwrap();
        assert_eq!(transport.count(&Method::DELETE, "/blogs/5"), 1);
    }

    #[tokio::test]
    async fn expired_session_propagates() {
        let (api, transport, _) = api_with(Some("expired"), Some("csrf"));
        transport.on(Method::DELETE, "/blogs/5", Reply::Status(401));

        let err = api.delete_blog(5).await.unwrap_err();
        assert!(err.is_auth_expired());
    }
}
