//! The request boundary: the single chokepoint for provider calls.
//!
//! Resolves a logical path against the configured base address, injects the
//! bearer token and content type, encodes JSON bodies, and normalizes every
//! non-success response into an [`HttpError`]. No retries, no timeouts.

use crate::{ApiError, ApiResult, HttpError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Structured body, sent as `application/json`.
    Json(serde_json::Value),
    /// Opaque body (e.g. an upload), sent untouched with no injected content type.
    Bytes(Vec<u8>),
}

/// Per-call options for [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub auth_token: Option<String>,
    pub body: Option<RequestBody>,
    pub headers: HeaderMap,
    /// When false, a success response yields the empty value without reading the body.
    pub parse_response: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            auth_token: None,
            body: None,
            headers: HeaderMap::new(),
            parse_response: true,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// Authenticate with a bearer token. Empty tokens are ignored.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Attach a structured body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Attach an opaque body.
    pub fn with_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn without_parsing(mut self) -> Self {
        self.parse_response = false;
        self
    }
}

/// Join `path` onto `base` with exactly one `/` between them. Absolute
/// `http(s)://` paths are returned unchanged.
pub fn resolve_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }

    format!("{}/{}", base, path)
}

/// HTTP client bound to one provider base address.
///
/// Cheap to clone; clones share the connection pool and cookie jar, so cookies
/// set by the provider travel with every later request.
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` with a cookie-carrying HTTP client.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http_client = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_http_client(base_url, http_client))
    }

    /// Create a client around an existing reqwest client.
    pub fn with_http_client(base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a logical path to an absolute, parsed URL.
    pub fn resolve(&self, path: &str) -> ApiResult<Url> {
        Ok(Url::parse(&resolve_url(&self.base_url, path))?)
    }

    /// Issue a request.
    ///
    /// Returns `Ok(None)` for 204 responses or when parsing is disabled,
    /// `Ok(Some(body))` otherwise.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<Option<T>> {
        let url = self.resolve(path)?;
        let RequestOptions {
            method,
            auth_token,
            body,
            mut headers,
            parse_response,
        } = options;

        if let Some(token) = auth_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            headers.insert(AUTHORIZATION, value);
        }

        let payload = match body {
            Some(RequestBody::Json(value)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(&value).map_err(ApiError::Encode)?)
            }
            Some(RequestBody::Bytes(bytes)) => Some(bytes),
            None => None,
        };

        debug!(method = %method, url = %url, authenticated = auth_token.is_some(), "Sending API request");

        let mut builder = self.http_client.request(method.clone(), url.clone()).headers(headers);
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            // A body that cannot be read is treated like one that cannot be parsed.
            let body = response.bytes().await.unwrap_or_default();
            let error = HttpError::from_body(status, &body);
            warn!(method = %method, url = %url, status = %status, "API request failed");
            return Err(error.into());
        }

        if status == StatusCode::NO_CONTENT || !parse_response {
            return Ok(None);
        }

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body).map_err(ApiError::Decode)?;
        Ok(Some(value))
    }

    /// Issue a request whose success response must carry a body.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(path, options)
            .await?
            .ok_or(ApiError::EmptyResponse)
    }

    /// Issue a request whose success body is ignored.
    pub async fn request_empty(&self, path: &str, options: RequestOptions) -> ApiResult<()> {
        self.request::<serde_json::Value>(path, options.without_parsing())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, body_string, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_resolve_relative_path_with_leading_slash() {
        assert_eq!(resolve_url("http://h/api", "/users/me"), "http://h/api/users/me");
    }

    #[test]
    fn test_resolve_relative_path_without_leading_slash() {
        assert_eq!(resolve_url("http://h/api", "users/me"), "http://h/api/users/me");
    }

    #[test]
    fn test_resolve_base_with_trailing_slash() {
        assert_eq!(resolve_url("http://h/api/", "/users/me"), "http://h/api/users/me");
        assert_eq!(resolve_url("http://h/api/", "users/me"), "http://h/api/users/me");
    }

    #[test]
    fn test_resolve_absolute_path_passes_through() {
        assert_eq!(resolve_url("http://h/api", "https://x/y"), "https://x/y");
        assert_eq!(resolve_url("http://h/api", "http://x/y"), "http://x/y");
    }

    #[test]
    fn test_with_auth_ignores_empty_token() {
        assert!(RequestOptions::get().with_auth("").auth_token.is_none());
        assert_eq!(
            RequestOptions::get().with_auth("T").auth_token.as_deref(),
            Some("T")
        );
    }

    #[test]
    fn test_client_resolve_rejects_bad_base() {
        let client = ApiClient::new("not a url").unwrap();
        assert!(matches!(client.resolve("/x"), Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unencodable_token_fails_before_sending() {
        let server = MockServer::start().await;
        let client = ApiClient::new(server.uri()).unwrap();

        let err = client
            .request_json::<Value>("/users/me", RequestOptions::get().with_auth("bad\ntoken"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidHeader(_)));
        assert_eq!(err.status(), None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bearer_and_json_headers_are_injected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/items"))
            .and(header("authorization", "Bearer T"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "a"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(format!("{}/api", server.uri())).unwrap();
        let options = RequestOptions::post()
            .with_auth("T")
            .with_json(&json!({"name": "a"}))
            .unwrap();

        let body: Value = client.request_json("/items", options).await.unwrap();
        assert_eq!(body, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_opaque_body_bypasses_serialization() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/upload"))
            .and(body_string("raw-bytes"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let result: Option<Value> = client
            .request("upload", RequestOptions::put().with_bytes("raw-bytes"))
            .await
            .unwrap();
        assert!(result.is_none());

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("content-type"));
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_no_content_yields_empty_even_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204).set_body_string("ignored"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let result: Option<Value> = client.request("/ping", RequestOptions::get()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_parse_opt_out_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        client
            .request_empty("/text", RequestOptions::get())
            .await
            .unwrap();

        let err = client
            .request_json::<Value>("/text", RequestOptions::get().without_parsing())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_error_status_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "invalid credentials", "attempts": 3})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .request_json::<Value>("/auth/login", RequestOptions::post())
            .await
            .unwrap_err();

        let http = err.http().unwrap();
        assert_eq!(http.status, StatusCode::UNAUTHORIZED);
        assert_eq!(http.message, "invalid credentials");
        assert_eq!(http.payload.as_ref().unwrap()["attempts"], 3);
    }

    #[tokio::test]
    async fn test_error_without_json_uses_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .request_json::<Value>("/anything", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_success_body_with_wrong_shape_is_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Expected {
            id: String,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nope": true})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .request_json::<Expected>("/x", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_caller_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let options = RequestOptions::get().with_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc"),
        );
        let _: Value = client.request_json("/posts", options).await.unwrap();
    }

    #[tokio::test]
    async fn test_absolute_path_ignores_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/elsewhere"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new("http://127.0.0.1:1/unused").unwrap();
        let body: Value = client
            .request_json(&format!("{}/elsewhere", server.uri()), RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }
}
