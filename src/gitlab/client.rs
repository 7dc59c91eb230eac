//! GitLab HTTP Client
//!
//! Thin wrapper over reqwest that owns the base URL and private token,
//! authenticates lazily on first use, and funnels every non-success
//! response through the error classifier. Each request helper takes a
//! `what` label naming the lookup so error messages say which resource
//! resolution failed.

use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::error::GitLabError;

/// Shared client for all GitLab tools.
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: String,
    authenticated: OnceCell<()>,
}

impl GitLabClient {
    /// `base_url` is the instance root, e.g. `https://gitlab.com`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
            authenticated: OnceCell::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Verify the token once, on first use.
    ///
    /// The OnceCell serializes concurrent first callers, so exactly one
    /// `GET /user` goes out even on a multi-threaded runtime. A failed
    /// check is not cached; the next call retries.
    async fn ensure_authenticated(&self) -> Result<(), GitLabError> {
        self.authenticated
            .get_or_try_init(|| async {
                tracing::debug!("authenticating against {}", self.base_url);
                let response = self
                    .http
                    .get(self.api_url("user"))
                    .header("PRIVATE-TOKEN", &self.token)
                    .send()
                    .await?;

                if response.status() == StatusCode::UNAUTHORIZED {
                    return Err(GitLabError::Authentication(
                        "token rejected by GitLab".to_string(),
                    ));
                }
                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(GitLabError::classify(status, &body, "current user"));
                }

                tracing::info!("authenticated against {}", self.base_url);
                Ok(())
            })
            .await
            .copied()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response, GitLabError> {
        self.ensure_authenticated().await?;

        let mut request = self
            .http
            .request(method, self.api_url(path))
            .header("PRIVATE-TOKEN", &self.token);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn read(response: Response, what: &str) -> Result<Value, GitLabError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::classify(status.as_u16(), &body, what));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| GitLabError::Api(format!("malformed response for {what}: {e}")))
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Value, GitLabError> {
        let response = self.send(Method::GET, path, query, None).await?;
        Self::read(response, what).await
    }

    /// GET an endpoint that returns raw text rather than JSON
    /// (e.g. `repository/files/:path/raw`).
    pub async fn get_raw(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<String, GitLabError> {
        let response = self.send(Method::GET, path, query, None).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::classify(status.as_u16(), &body, what));
        }
        Ok(response.text().await?)
    }

    pub async fn post(&self, path: &str, body: &Value, what: &str) -> Result<Value, GitLabError> {
        let response = self.send(Method::POST, path, &[], Some(body)).await?;
        Self::read(response, what).await
    }

    pub async fn put(&self, path: &str, body: &Value, what: &str) -> Result<Value, GitLabError> {
        let response = self.send(Method::PUT, path, &[], Some(body)).await?;
        Self::read(response, what).await
    }

    pub async fn delete(&self, path: &str, what: &str) -> Result<Value, GitLabError> {
        let response = self.send(Method::DELETE, path, &[], None).await?;
        Self::read(response, what).await
    }
}

/// Percent-encode a namespaced path ("group/project", "dir/file.rs") for use
/// as a single URL segment, the form the GitLab API expects.
pub fn encode_path(path: &str) -> String {
    path.replace('%', "%25").replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("group/project"), "group%2Fproject");
        assert_eq!(encode_path("src/main.rs"), "src%2Fmain.rs");
        assert_eq!(encode_path("plain"), "plain");
    }

    #[tokio::test]
    async fn test_lazy_auth_happens_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .and(header("PRIVATE-TOKEN", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "bot"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v4/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "17.0.0"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = GitLabClient::new(server.uri(), "secret");
        client.get("version", &[], "version").await.unwrap();
        client.get("version", &[], "version").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_token_maps_to_authentication() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "401 Unauthorized"
            })))
            .mount(&server)
            .await;

        let client = GitLabClient::new(server.uri(), "bad-token");
        let err = client.get("version", &[], "version").await.unwrap_err();
        assert_eq!(err.kind(), "AuthenticationError");
    }

    #[tokio::test]
    async fn test_connection_failure_is_generic() {
        // Nothing listens on this port.
        let client = GitLabClient::new("http://127.0.0.1:1", "token");
        let err = client.get("version", &[], "version").await.unwrap_err();
        assert_eq!(err.kind(), "GenericApiError");
    }
}
