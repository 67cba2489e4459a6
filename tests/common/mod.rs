//! In-process stand-in for the REST backend, served with axum on an
//! ephemeral port. Every request is recorded so tests can assert on what
//! did (or did not) go over the wire.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse, Response},
    Json, Router,
};
use interviewq::{ApiClient, ApiConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const CSRF_TOKEN: &str = "test-csrf-token";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub csrf: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    requests: Vec<Recorded>,
    identity: Value,
    questions: Vec<Value>,
    tags: Vec<Value>,
    logs: Vec<Value>,
    failures: HashMap<(String, String), (u16, Value)>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<Inner>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        {
            let mut inner = state.inner.lock().unwrap();
            inner.identity = json!({"authenticated": false, "user": null});
            inner.next_id = 100;
        }

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&ApiConfig::with_base_url(self.base_url())).unwrap()
    }

    /// Client that already holds session and CSRF cookies.
    pub async fn logged_in_client(&self) -> ApiClient {
        let client = self.client();
        let _: Value = client
            .post("accounts/login/", &json!({"username": "alice", "password": PASSWORD}))
            .await
            .unwrap();
        self.clear_requests();
        client
    }

    pub fn set_identity(&self, identity: Value) {
        self.state.inner.lock().unwrap().identity = identity;
    }

    pub fn add_tag(&self, id: i64, name: &str) {
        self.state.inner.lock().unwrap().tags.push(json!({
            "id": id,
            "name": name,
            "description": "",
            "is_active": true
        }));
    }

    pub fn add_question(&self, id: i64, title: &str, tag_ids: &[i64]) {
        let mut inner = self.state.inner.lock().unwrap();
        let tags = resolve_tags(&inner.tags, tag_ids);
        inner.questions.push(json!({
            "id": id,
            "title": title,
            "source": "LeetCode",
            "content": "",
            "difficulty": "Easy",
            "slug": slugify(title),
            "tags": tags,
            "is_active": true,
            "attempts_count": 0
        }));
    }

    pub fn add_log(&self, log: Value) {
        self.state.inner.lock().unwrap().logs.push(log);
    }

    /// Answer `method path` with `status` and `body` until cleared.
    pub fn fail(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .inner
            .lock()
            .unwrap()
            .failures
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn clear_failures(&self) {
        self.state.inner.lock().unwrap().failures.clear();
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.inner.lock().unwrap().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.inner.lock().unwrap().requests.clear();
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self, method: &str, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
    }

    pub fn question_titles(&self) -> Vec<String> {
        self.state
            .inner
            .lock()
            .unwrap()
            .questions
            .iter()
            .map(|q| q["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Address nothing listens on, for transport failures.
pub fn unreachable_client() -> ApiClient {
    ApiClient::new(&ApiConfig::with_base_url("http://127.0.0.1:9")).unwrap()
}

fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn resolve_tags(tags: &[Value], ids: &[i64]) -> Vec<Value> {
    tags.iter()
        .filter(|t| ids.contains(&t["id"].as_i64().unwrap_or_default()))
        .cloned()
        .collect()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/api/").to_string();
    let csrf = headers
        .get("x-csrftoken")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Option<Value> = serde_json::from_slice(&body).ok();

    let mut inner = state.inner.lock().unwrap();
    inner.requests.push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        csrf: csrf.clone(),
        content_type,
        body: body.clone(),
    });

    if let Some((status, payload)) = inner.failures.get(&(method.to_string(), path.clone())) {
        let status = StatusCode::from_u16(*status).unwrap();
        return (status, Json(payload.clone())).into_response();
    }

    let exempt = path == "accounts/login/" || path == "accounts/register/";
    let unsafe_method = method != Method::GET && method != Method::HEAD;
    if unsafe_method && !exempt && csrf.as_deref() != Some(CSRF_TOKEN) {
        return detail(StatusCode::FORBIDDEN, "CSRF Failed: CSRF token missing.");
    }

    route(&mut inner, &method, &path, body.unwrap_or(Value::Null))
}

fn route(inner: &mut Inner, method: &Method, path: &str, body: Value) -> Response {
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    let id_at = |i: usize| segments.get(i).and_then(|s| s.parse::<i64>().ok()).unwrap_or(-1);

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["accounts", "identity"]) => (
            AppendHeaders([(header::SET_COOKIE, format!("csrftoken={}; Path=/", CSRF_TOKEN))]),
            Json(inner.identity.clone()),
        )
            .into_response(),
        ("POST", ["accounts", "login"]) => {
            if body["password"] != PASSWORD {
                return detail(StatusCode::BAD_REQUEST, "Invalid credentials");
            }
            let user = json!({"id": 1, "username": body["username"], "email": ""});
            inner.identity = json!({"authenticated": true, "user": user.clone()});
            (
                AppendHeaders([
                    (header::SET_COOKIE, "sessionid=session-1; Path=/; HttpOnly".to_string()),
                    (header::SET_COOKIE, format!("csrftoken={}; Path=/", CSRF_TOKEN)),
                ]),
                Json(user),
            )
                .into_response()
        }
        ("POST", ["accounts", "register"]) => {
            if body["username"] == "taken" {
                return detail(StatusCode::BAD_REQUEST, "Username already exists.");
            }
            (StatusCode::CREATED, Json(json!({"id": 2, "username": body["username"]}))).into_response()
        }
        ("POST", ["accounts", "logout"]) => {
            inner.identity = json!({"authenticated": false, "user": null});
            Json(json!({"detail": "Logged out"})).into_response()
        }

        ("GET", ["questions"]) => Json(Value::Array(inner.questions.clone())).into_response(),
        ("POST", ["questions"]) => {
            inner.next_id += 1;
            let id = inner.next_id;
            let question = materialize_question(inner, id, &body);
            match question {
                Ok(question) => {
                    inner.questions.push(question.clone());
                    (StatusCode::CREATED, Json(question)).into_response()
                }
                Err(response) => response,
            }
        }
        ("GET", ["questions", _]) => {
            let id = id_at(1);
            match inner.questions.iter().find(|q| q["id"] == id) {
                Some(q) => Json(q.clone()).into_response(),
                None => detail(StatusCode::NOT_FOUND, "Not found."),
            }
        }
        ("PUT", ["questions", _]) => {
            let id = id_at(1);
            let Some(index) = inner.questions.iter().position(|q| q["id"] == id) else {
                return detail(StatusCode::NOT_FOUND, "Not found.");
            };
            match materialize_question(inner, id, &body) {
                Ok(question) => {
                    inner.questions[index] = question.clone();
                    Json(question).into_response()
                }
                Err(response) => response,
            }
        }
        ("DELETE", ["questions", _]) => {
            let id = id_at(1);
            let before = inner.questions.len();
            inner.questions.retain(|q| q["id"] != id);
            if inner.questions.len() == before {
                return detail(StatusCode::NOT_FOUND, "Not found.");
            }
            StatusCode::NO_CONTENT.into_response()
        }

        ("GET", ["tags"]) => Json(Value::Array(inner.tags.clone())).into_response(),
        ("POST", ["tags"]) => {
            inner.next_id += 1;
            let tag = json!({
                "id": inner.next_id,
                "name": body["name"],
                "description": body["description"],
                "is_active": body["is_active"]
            });
            inner.tags.push(tag.clone());
            (StatusCode::CREATED, Json(tag)).into_response()
        }
        ("PUT", ["tags", _]) => {
            let id = id_at(1);
            match inner.tags.iter_mut().find(|t| t["id"] == id) {
                Some(tag) => {
                    tag["name"] = body["name"].clone();
                    tag["description"] = body["description"].clone();
                    tag["is_active"] = body["is_active"].clone();
                    Json(tag.clone()).into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "Not found."),
            }
        }
        ("DELETE", ["tags", _]) => {
            let id = id_at(1);
            inner.tags.retain(|t| t["id"] != id);
            StatusCode::NO_CONTENT.into_response()
        }

        ("GET", ["questions", _, "logs"]) => {
            let question_id = id_at(1);
            let logs: Vec<Value> = inner
                .logs
                .iter()
                .filter(|l| l["question"]["id"] == question_id)
                .cloned()
                .collect();
            Json(Value::Array(logs)).into_response()
        }
        ("POST", ["questions", _, "logs"]) => {
            let question_id = id_at(1);
            inner.next_id += 1;
            let log = materialize_log(inner, inner.next_id, question_id, &body);
            inner.logs.push(log.clone());
            (StatusCode::CREATED, Json(log)).into_response()
        }
        ("PUT", ["questions", _, "logs", _]) => {
            let (question_id, log_id) = (id_at(1), id_at(3));
            let log = materialize_log(inner, log_id, question_id, &body);
            match inner.logs.iter_mut().find(|l| l["id"] == log_id) {
                Some(existing) => {
                    *existing = log.clone();
                    Json(log).into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "Not found."),
            }
        }
        ("DELETE", ["questions", _, "logs", _]) => {
            let log_id = id_at(3);
            inner.logs.retain(|l| l["id"] != log_id);
            StatusCode::NO_CONTENT.into_response()
        }

        _ => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

fn materialize_question(inner: &Inner, id: i64, body: &Value) -> Result<Value, Response> {
    if body.get("slug").is_some() {
        return Err(detail(StatusCode::BAD_REQUEST, "Supplying a slug is not allowed."));
    }
    let tag_ids: Vec<i64> = body["tag_ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let known: Vec<i64> = inner.tags.iter().filter_map(|t| t["id"].as_i64()).collect();
    if let Some(bad) = tag_ids.iter().find(|id| !known.contains(id)) {
        return Err(detail(StatusCode::BAD_REQUEST, &format!("Invalid tag IDs: [{}].", bad)));
    }

    let title = body["title"].as_str().unwrap_or_default();
    Ok(json!({
        "id": id,
        "title": title,
        "source": body["source"],
        "content": body["content"],
        "difficulty": body["difficulty"],
        "slug": slugify(title),
        "tags": resolve_tags(&inner.tags, &tag_ids),
        "is_active": body["is_active"],
        "attempts_count": 0
    }))
}

fn materialize_log(inner: &Inner, id: i64, question_id: i64, body: &Value) -> Value {
    let title = inner
        .questions
        .iter()
        .find(|q| q["id"] == question_id)
        .and_then(|q| q["title"].as_str())
        .unwrap_or_default()
        .to_string();
    json!({
        "id": id,
        "question": {"id": question_id, "title": title},
        "date_attempted": body["date_attempted"],
        "time_spent_min": body["time_spent_min"],
        "outcome": body["outcome"],
        "solution_approach": body["solution_approach"],
        "self_notes": body["self_notes"]
    })
}
