// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for faking the Kubernetes API and a plain HTTP server.

use http::{Method, Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::Service;

/// An in-memory Kubernetes API server.
/// Serves fixed discovery documents and keeps created objects by their item path,
/// so a second apply observes the first one.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    discovery: HashMap<String, String>,
    objects: BTreeMap<String, Value>,
    requests: Vec<(String, String)>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve an APIResourceList at `path` (e.g. `/api/v1`).
    /// Each resource is `(plural, kind, namespaced)`.
    pub fn with_resources(
        self,
        path: &str,
        group_version: &str,
        resources: &[(&str, &str, bool)],
    ) -> Self {
        let list = APIResourceList {
            group_version: group_version.to_string(),
            resources: resources
                .iter()
                .map(|(plural, kind, namespaced)| APIResource {
                    name: plural.to_string(),
                    singular_name: kind.to_lowercase(),
                    kind: kind.to_string(),
                    namespaced: *namespaced,
                    verbs: ["create", "get", "list", "update"]
                        .iter()
                        .map(|v| v.to_string())
                        .collect(),
                    ..Default::default()
                })
                .collect(),
        };

        self.state
            .lock()
            .unwrap()
            .discovery
            .insert(path.to_string(), serde_json::to_string(&list).unwrap());
        self
    }

    /// Build a kube Client backed by this fake
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request seen, as `(method, path)`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Only the POST and PUT requests seen
    pub fn writes(&self) -> Vec<(String, String)> {
        self.requests()
            .into_iter()
            .filter(|(m, _)| m == "POST" || m == "PUT")
            .collect()
    }

    /// The stored object at an item path
    pub fn stored(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (u16, String) {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method.to_string(), path.to_string()));

        match method.as_str() {
            "GET" => {
                if let Some(doc) = state.discovery.get(path) {
                    return (200, doc.clone());
                }
                match state.objects.get(path) {
                    Some(obj) => (200, obj.to_string()),
                    None => (404, status_json(404, "NotFound", &format!("{} not found", path))),
                }
            }
            "POST" => {
                let Ok(mut obj) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                let Some(name) = obj["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status_json(422, "Invalid", "metadata.name is required"));
                };
                let item_path = format!("{}/{}", path, name);
                if state.objects.contains_key(&item_path) {
                    let message = format!("{} already exists", name);
                    return (409, status_json(409, "AlreadyExists", &message));
                }
                obj["metadata"]["resourceVersion"] = Value::from("1");
                state.objects.insert(item_path, obj.clone());
                (201, obj.to_string())
            }
            "PUT" => {
                let Ok(mut obj) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                let Some(current) = state.objects.get(path) else {
                    return (404, status_json(404, "NotFound", &format!("{} not found", path)));
                };
                let live_version = current["metadata"]["resourceVersion"].clone();
                if obj["metadata"]["resourceVersion"] != live_version {
                    return (409, status_json(409, "Conflict", "the object has been modified"));
                }
                let next = live_version
                    .as_str()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0)
                    + 1;
                obj["metadata"]["resourceVersion"] = Value::from(next.to_string());
                state.objects.insert(path.to_string(), obj.clone());
                (200, obj.to_string())
            }
            _ => (405, status_json(405, "MethodNotAllowed", "method not allowed")),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let body = req.into_body().collect().await?.to_bytes();

            let (status, body) = server.handle(&method, &path, &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))?)
        })
    }
}

/// A Kubernetes Status failure body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A reqwest client that never goes through a proxy, for talking to `serve_once`
pub fn local_http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Answer exactly one HTTP request on a local port with `status` and `body`.
/// Returns the URL to request.
pub async fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\n\
         connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}/manifest.yaml", addr)
}
