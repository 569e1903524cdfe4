//! Credentials and restricted-access session
//!
//! Restricted records are only readable with a session cookie obtained by
//! opening the record page with a restricted access token. The handshake runs
//! once per [`Session`]; a failed attempt leaves the cookie unresolved so the
//! next caller tries again.

use std::fmt;

use tokio::sync::OnceCell;
use url::Url;
use zs_core::{Error, Result, Settings};

/// Name of the cookie the record page must set
const SESSION_COOKIE: &str = "session";

pub struct Session {
    access_token: String,
    restricted_access_token: Option<String>,
    cookies: OnceCell<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("restricted", &self.restricted_access_token.is_some())
            .field("cookies_resolved", &self.cookies.initialized())
            .finish()
    }
}

impl Session {
    pub fn new(access_token: impl Into<String>, restricted_access_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            restricted_access_token: restricted_access_token.filter(|t| !t.is_empty()),
            cookies: OnceCell::new(),
        }
    }

    /// Build from settings; fails before any network call without an access token
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            settings.access_token()?,
            settings.restricted_access_token.clone(),
        ))
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted_access_token.is_some()
    }

    /// Cookie header value for restricted records
    ///
    /// `None` when no restricted access token is configured. Otherwise the
    /// handshake runs against `record_id` the first time and its result is
    /// reused for the lifetime of the session.
    pub async fn authorized_cookies(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        record_id: &str,
    ) -> Result<Option<&str>> {
        let Some(token) = self.restricted_access_token.as_deref() else {
            return Ok(None);
        };

        let cookies = self
            .cookies
            .get_or_try_init(|| handshake(http, base_url, record_id, token))
            .await?;
        Ok(Some(cookies.as_str()))
    }
}

async fn handshake(
    http: &reqwest::Client,
    base_url: &str,
    record_id: &str,
    token: &str,
) -> Result<String> {
    let url = Url::parse_with_params(&format!("{base_url}/record/{record_id}"), &[("token", token)])
        .map_err(|e| Error::Config(format!("Invalid record URL: {e}")))?;

    tracing::debug!(record_id, "Negotiating restricted access session");

    let response = http
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let mut has_session = false;
    let cookies: Vec<String> = response
        .cookies()
        .map(|cookie| {
            has_session |= cookie.name() == SESSION_COOKIE;
            format!("{}={}", cookie.name(), cookie.value())
        })
        .collect();

    if !has_session {
        return Err(Error::Auth(format!(
            "Failure to retrieve session cookie with given restricted access token. \
             Is the token valid? Please check by opening {url} manually in your browser."
        )));
    }

    Ok(cookies.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};

    fn base(server: &Server) -> String {
        server.url_str("/").trim_end_matches('/').to_string()
    }

    #[tokio::test]
    async fn test_no_restricted_token_means_no_cookie() {
        let session = Session::new("token", None);
        let http = reqwest::Client::new();

        // No server: any request would fail
        let cookies = session
            .authorized_cookies(&http, "http://127.0.0.1:9", "1")
            .await
            .unwrap();
        assert!(cookies.is_none());
        assert!(!session.is_restricted());
    }

    #[tokio::test]
    async fn test_handshake_runs_once() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/record/42"),
                request::query(url_decoded(contains(("token", "secret")))),
            ])
            .times(1)
            .respond_with(
                status_code(200)
                    .append_header("Set-Cookie", "session=abc123; Path=/; HttpOnly")
                    .append_header("Set-Cookie", "csrftoken=xyz; Path=/"),
            ),
        );

        let session = Session::new("token", Some("secret".into()));
        let http = reqwest::Client::new();
        let base = base(&server);

        let first = session.authorized_cookies(&http, &base, "42").await.unwrap();
        assert_eq!(first, Some("session=abc123; csrftoken=xyz"));

        let second = session.authorized_cookies(&http, &base, "42").await.unwrap();
        assert_eq!(second, Some("session=abc123; csrftoken=xyz"));
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_handshake() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/record/42"))
                .times(1)
                .respond_with(delay_and_then(
                    std::time::Duration::from_millis(100),
                    status_code(200).insert_header("Set-Cookie", "session=shared; Path=/"),
                )),
        );

        let session = Session::new("token", Some("secret".into()));
        let http = reqwest::Client::new();
        let base = base(&server);

        let (first, second) = tokio::join!(
            session.authorized_cookies(&http, &base, "42"),
            session.authorized_cookies(&http, &base, "42"),
        );
        assert_eq!(first.unwrap(), Some("session=shared"));
        assert_eq!(second.unwrap(), Some("session=shared"));
    }

    #[tokio::test]
    async fn test_missing_session_cookie_is_auth_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/record/7"))
                .times(2)
                .respond_with(status_code(200)),
        );

        let session = Session::new("token", Some("bad".into()));
        let http = reqwest::Client::new();
        let base = base(&server);

        let err = session.authorized_cookies(&http, &base, "7").await.unwrap_err();
        match err {
            Error::Auth(msg) => assert!(msg.contains("/record/7?token=bad")),
            other => panic!("expected auth error, got {other:?}"),
        }

        // Failure is not cached
        assert!(session.authorized_cookies(&http, &base, "7").await.is_err());
    }

    #[test]
    fn test_missing_access_token() {
        let err = Session::from_settings(&Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
