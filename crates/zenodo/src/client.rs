//! Zenodo REST client
//!
//! Every request carries `Authorization: Bearer <token>`. Requests scoped to a
//! record also carry the restricted-access cookie when one is configured.
//! Non-success statuses become [`Error::Http`]; nothing is retried here.

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use reqwest::{Body, Method, Response};
use serde::de::DeserializeOwned;
use zs_core::{Error, Result, Settings};

use crate::session::Session;

const JSON_MIME: &str = "application/json";

/// One API call
#[derive(Debug)]
pub struct ApiRequest<'a> {
    method: Method,
    url: &'a str,
    body: Option<Body>,
    content_length: Option<u64>,
    record_id: Option<&'a str>,
    json: bool,
}

impl<'a> ApiRequest<'a> {
    pub fn get(url: &'a str) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
            content_length: None,
            record_id: None,
            json: false,
        }
    }

    /// PUT `body`, which may be a stream such as an open file
    pub fn put(url: &'a str, body: impl Into<Body>) -> Self {
        Self {
            method: Method::PUT,
            url,
            body: Some(body.into()),
            content_length: None,
            record_id: None,
            json: false,
        }
    }

    /// Attach the restricted-access cookie negotiated for `record_id`
    pub fn restricted(mut self, record_id: &'a str) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Announce the body size up front; streamed bodies are chunked otherwise
    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Send `Content-Type: application/json`
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Authenticated client for one Zenodo instance
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Create a client from settings
    ///
    /// Fails with [`Error::Config`] when no access token is configured.
    pub fn new(settings: &Settings) -> Result<Self> {
        let session = Session::from_settings(settings)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("zs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url().to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/records/1`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a request and fail on any non-success status
    pub async fn send(&self, request: ApiRequest<'_>) -> Result<Response> {
        let cookies = match request.record_id {
            Some(record_id) => {
                self.session
                    .authorized_cookies(&self.http, &self.base_url, record_id)
                    .await?
            }
            None => None,
        };

        let mut builder = self
            .http
            .request(request.method.clone(), request.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.session.access_token()));

        if request.json {
            builder = builder.header(CONTENT_TYPE, JSON_MIME);
        }
        if let Some(cookies) = cookies {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(length) = request.content_length {
            builder = builder.header(CONTENT_LENGTH, length);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                method = %request.method,
                url = request.url,
                status = status.as_u16(),
                "Request failed"
            );
            return Err(Error::Http {
                status: status.as_u16(),
                url: request.url.to_string(),
            });
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest<'_>) -> Result<T> {
        let url = request.url.to_string();
        let body = self
            .send(request.json())
            .await?
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| Error::InvalidResponse(format!("{url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::{Value, json};

    fn client(server: &Server, restricted: Option<&str>) -> ApiClient {
        let mut settings = Settings::new("tok");
        settings.endpoint = Some(server.url_str("/"));
        settings.restricted_access_token = restricted.map(str::to_string);
        ApiClient::new(&settings).unwrap()
    }

    #[test]
    fn test_requires_access_token() {
        let err = ApiClient::new(&Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let mut settings = Settings::new("tok");
        settings.sandbox = true;
        let client = ApiClient::new(&settings).unwrap();
        assert_eq!(
            client.endpoint("/api/records/1"),
            "https://sandbox.zenodo.org/api/records/1"
        );
    }

    #[tokio::test]
    async fn test_sends_bearer_and_decodes_json() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/records/1"),
                request::headers(contains(("authorization", "Bearer tok"))),
                request::headers(contains(("content-type", "application/json"))),
            ])
            .respond_with(json_encoded(json!({"id": 1}))),
        );

        let client = client(&server, None);
        let url = client.endpoint("/api/records/1");
        let value: Value = client.send_json(ApiRequest::get(&url)).await.unwrap();
        assert_eq!(value["id"], 1);
    }

    #[tokio::test]
    async fn test_non_success_carries_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/records/0"))
                .respond_with(status_code(404)),
        );

        let client = client(&server, None);
        let url = client.endpoint("/api/records/0");
        let err = client.send(ApiRequest::get(&url)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/records/2"))
                .respond_with(status_code(200).body("<html>maintenance</html>")),
        );

        let client = client(&server, None);
        let url = client.endpoint("/api/records/2");
        let err = client
            .send_json::<Value>(ApiRequest::get(&url))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_restricted_request_carries_cookie() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/record/9"))
                .times(1)
                .respond_with(status_code(200).insert_header("Set-Cookie", "session=s1; Path=/")),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/records/9"),
                request::headers(contains(("cookie", "session=s1"))),
            ])
            .times(2)
            .respond_with(json_encoded(json!({}))),
        );

        let client = client(&server, Some("restricted"));
        let url = client.endpoint("/api/records/9");
        for _ in 0..2 {
            let _: Value = client
                .send_json(ApiRequest::get(&url).restricted("9"))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_put_streams_file_with_length() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", "/api/files/b/out.txt"),
                request::headers(contains(("content-length", "11"))),
                request::body("hello world"),
            ])
            .times(1)
            .respond_with(status_code(201)),
        );

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "hello world").unwrap();
        let file = tokio::fs::File::open(&path).await.unwrap();

        let client = client(&server, None);
        let url = client.endpoint("/api/files/b/out.txt");
        let response = client
            .send(ApiRequest::put(&url, file).content_length(11))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }
}
