use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::config::ApiConfig;
use crate::errors::{ClientError, ClientResult};
use crate::{log_request, log_request_error};

/// Path prefix every endpoint lives under.
pub const API_PREFIX: &str = "/api/";

/// The single point of HTTP egress.
///
/// Requests carry JSON content headers and the shared cookie jar (session +
/// CSRF cookies). Unsafe methods echo the CSRF cookie as a header. Non-2xx
/// responses are logged and handed back unchanged as [`ClientError::Http`];
/// nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    jar: Arc<Jar>,
    csrf_cookie: String,
    csrf_header: HeaderName,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let base = api_base(&config.base_url)?;
        let csrf_header = HeaderName::from_bytes(config.csrf_header.trim().as_bytes())
            .map_err(|e| ClientError::InvalidConfig(format!("CSRF header name: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base,
            jar,
            csrf_cookie: config.csrf_cookie.trim().to_string(),
            csrf_header,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Current value of the CSRF cookie for the API origin, if the backend
    /// has set one.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        find_cookie(cookies, &self.csrf_cookie)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        self.decode(Method::GET, path, response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        self.decode(Method::POST, path, response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        self.decode(Method::PUT, path, response).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PATCH, path, Some(body)).await?;
        self.decode(Method::PATCH, path, response).await
    }

    /// POST without a body, ignoring whatever the server answers with.
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        self.send::<()>(Method::POST, path, None).await?;
        Ok(())
    }

    /// DELETE usually answers 204 with no body, so nothing is decoded.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        log_request!(method, path);

        let mut request = self.client.request(method.clone(), url);
        if is_unsafe(&method) {
            match self.csrf_token() {
                Some(token) => request = request.header(self.csrf_header.clone(), token),
                None => warn!(
                    method = %method,
                    path = %path,
                    cookie = %self.csrf_cookie,
                    "CSRF token not found for unsafe request"
                ),
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                log_request_error!(method, path, error = err);
                return Err(ClientError::Transport(err));
            }
        };

        let status = response.status();
        if status.is_success() {
            log_request!(method, path, status = status);
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text).ok();
        let detail = body
            .as_ref()
            .and_then(|value| value.get("detail"))
            .and_then(|detail| detail.as_str())
            .map(str::to_string);

        log_request_error!(method, path, status = status, detail = detail);
        Err(ClientError::Http {
            status,
            detail,
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        response: Response,
    ) -> ClientResult<T> {
        response.json::<T>().await.map_err(|err| {
            log_request_error!(method, path, error = err);
            ClientError::Transport(err)
        })
    }
}

fn api_base(base_url: &str) -> ClientResult<Url> {
    let joined = format!("{}{}", base_url.trim().trim_end_matches('/'), API_PREFIX);
    let url = Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", joined, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            other, joined
        ))),
    }
}

pub fn is_unsafe(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Relative endpoint paths under [`API_PREFIX`].
pub mod endpoints {
    use crate::models::{LogId, QuestionId, TagId};

    pub const QUESTIONS: &str = "questions/";
    pub const TAGS: &str = "tags/";
    pub const LOGIN: &str = "accounts/login/";
    pub const REGISTER: &str = "accounts/register/";
    pub const LOGOUT: &str = "accounts/logout/";
    pub const IDENTITY: &str = "accounts/identity/";

    pub fn question(id: QuestionId) -> String {
        format!("questions/{}/", id)
    }

    pub fn tag(id: TagId) -> String {
        format!("tags/{}/", id)
    }

    pub fn question_logs(question_id: QuestionId) -> String {
        format!("questions/{}/logs/", question_id)
    }

    pub fn question_log(question_id: QuestionId, log_id: LogId) -> String {
        format!("questions/{}/logs/{}/", question_id, log_id)
    }
}

/// Pull one cookie's value out of a `name=value; name=value` header.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
