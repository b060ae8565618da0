//! Scripted transport for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
use crate::core::auth::Role;

pub const TEST_BASE_URL: &str = "http://backend.test/api";

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

enum Route {
    /// Replies in order; the last reply repeats
    Scripted(VecDeque<Result<HttpResponse, TransportError>>),
    Dynamic(Handler),
}

/// Transport answering from per-route scripts and recording every request.
/// Each call yields to the scheduler once so concurrent requests interleave.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.push(method, path, Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Err(TransportError::new(message)));
    }

    pub fn respond_with<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Route::Dynamic(Box::new(handler)));
    }

    /// Hold requests to `path` until [`release`](Self::release) is called
    pub fn hold(&self, path: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, path: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(path) {
            gate.add_permits(1);
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        let url = format!("{}{}", TEST_BASE_URL, path);
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    fn push(&self, method: Method, path: &str, reply: Result<HttpResponse, TransportError>) {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .entry((method, path.to_string()))
            .or_insert_with(|| Route::Scripted(VecDeque::new()));
        if matches!(route, Route::Dynamic(_)) {
            *route = Route::Scripted(VecDeque::new());
        }
        if let Route::Scripted(queue) = route {
            queue.push_back(reply);
        }
    }

    fn reply(&self, request: &HttpRequest, path: &str) -> Result<HttpResponse, TransportError> {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(request.method, path.to_string())) {
            Some(Route::Scripted(queue)) if queue.len() > 1 => {
                queue.pop_front().unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
            }
            Some(Route::Scripted(queue)) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, ""))),
            Some(Route::Dynamic(handler)) => handler(request),
            None => Ok(HttpResponse::new(
                404,
                r#"{"error":{"message":"Not found"}}"#,
            )),
        }
    }
}

impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;

        let path = request
            .url
            .strip_prefix(TEST_BASE_URL)
            .unwrap_or(&request.url)
            .to_string();

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.reply(&request, &path)
    }
}

/// Login/register success body for user `1 / "A B"`
pub fn auth_body(access: &str, refresh: &str, role: Role) -> String {
    serde_json::json!({
        "success": true,
        "data": {
            "user": {"id": 1, "fullName": "A B", "role": role},
            "tokens": {"access": access, "refresh": refresh}
        }
    })
    .to_string()
}

/// 200 when the request carries `Bearer <token>`, 401 otherwise
pub fn require_token(
    token: &'static str,
    body: &'static str,
) -> impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static {
    move |request| {
        let expected = format!("Bearer {}", token);
        if request.header("Authorization") == Some(expected.as_str()) {
            Ok(HttpResponse::new(200, body))
        } else {
            Ok(HttpResponse::new(
                401,
                r#"{"error":{"message":"Token is invalid or expired"}}"#,
            ))
        }
    }
}
