// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::transport::{OutboundRequest, Transport, TransportError, TransportResponse};

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16),
    Json(u16, Value),
    /// 200 with `Set-Cookie: {name}={value}; Path=/`.
    SetCookie(&'static str, &'static str),
    /// Connection refused.
    Network,
    /// Never answers.
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Replies are queued per `(method, path)`; an exhausted queue answers 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let path = request.url.path().to_string();
        let reply = {
            self.log.lock().unwrap().push(RecordedRequest {
                method: request.method.clone(),
                path: path.clone(),
                headers: request.headers.clone(),
                body: request
                    .body
                    .as_deref()
                    .and_then(|b| serde_json::from_slice(b).ok()),
            });
            let mut routes = self.routes.lock().unwrap();
            let next = routes
                .get_mut(&(request.method.clone(), path))
                .and_then(VecDeque::pop_front);
            next.unwrap_or(Reply::Status(404))
        };

        match reply {
            Reply::Status(status) => Ok(response(status, HeaderMap::new(), Vec::new())),
            Reply::Json(status, body) => Ok(response(
                status,
                HeaderMap::new(),
                serde_json::to_vec(&body).unwrap(),
            )),
            Reply::SetCookie(name, value) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    SET_COOKIE,
                    HeaderValue::from_str(&format!("{name}={value}; Path=/")).unwrap(),
                );
                Ok(response(200, headers, Vec::new()))
            }
            Reply::Network => Err(TransportError::Connect("connection refused".to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn response(status: u16, headers: HeaderMap, body: Vec<u8>) -> TransportResponse {
    TransportResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers,
        body,
    }
}
