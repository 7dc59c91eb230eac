//! Error taxonomy for remote calls
//!
//! Every tool, no matter which GitLab endpoint it wraps, reports failures
//! through this one closed set of variants. Classification happens in a
//! single ordered chain (`classify`) so the precedence rule — authentication
//! wins over everything else — lives in exactly one place.

use serde_json::Value;
use thiserror::Error;

/// Normalized failure from a tool invocation.
#[derive(Debug, Error)]
pub enum GitLabError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("GitLab server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("GitLab API error: {0}")]
    Api(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl GitLabError {
    /// Classify an HTTP failure response.
    ///
    /// `what` names the lookup being performed ("project group/repo",
    /// "branch feature/x of group/repo", ...) so that two 404s from
    /// different lookups stay distinguishable in their messages while
    /// sharing the same variant.
    ///
    /// Checks run in priority order; 401 is tested first so an
    /// authentication failure classifies as such even when the response
    /// body suggests something else.
    pub fn classify(status: u16, body: &str, what: &str) -> Self {
        let detail = extract_message(body);
        match status {
            401 => Self::Authentication(or_default(detail, "token rejected by GitLab")),
            403 => Self::Permission(format!("{what}: {}", or_default(detail, "access denied"))),
            404 => Self::NotFound(format!("{what} not found")),
            429 => Self::RateLimit(or_default(detail, "too many requests")),
            500..=599 => Self::Server {
                status,
                message: or_default(detail, "remote failure"),
            },
            _ => Self::Api(format!(
                "HTTP {status} for {what}: {}",
                or_default(detail, "unexpected response")
            )),
        }
    }

    /// Stable tag for logging and the protocol error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::Permission(_) => "PermissionError",
            Self::NotFound(_) => "NotFoundError",
            Self::RateLimit(_) => "RateLimitError",
            Self::Server { .. } => "ServerError",
            Self::Api(_) => "GenericApiError",
            Self::Validation(_) => "ValidationError",
        }
    }
}

impl From<reqwest::Error> for GitLabError {
    /// Transport-level failures (connect, timeout, body decode) carry no
    /// usable status code and collapse into the generic variant with the
    /// original message preserved.
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::classify(status.as_u16(), "", "request"),
            None => Self::Api(err.to_string()),
        }
    }
}

/// Pull a human-readable message out of a GitLab error body.
///
/// GitLab answers with `{"message": ...}` or `{"error": ...}`; the message
/// value may itself be an object or array for validation failures.
fn extract_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let msg = parsed.get("message").or_else(|| parsed.get("error"))?;
    match msg {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn or_default(detail: Option<String>, fallback: &str) -> String {
    detail.unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (401, "AuthenticationError"),
            (403, "PermissionError"),
            (404, "NotFoundError"),
            (429, "RateLimitError"),
            (500, "ServerError"),
            (503, "ServerError"),
        ];
        for (status, expected) in cases {
            let err = GitLabError::classify(status, "", "resource");
            assert_eq!(err.kind(), expected, "status {status}");
        }
    }

    #[test]
    fn test_auth_wins_over_body_content() {
        // A 401 whose body claims "404 Not Found" still classifies as auth.
        let err = GitLabError::classify(401, r#"{"message": "404 Not Found"}"#, "project x");
        assert_eq!(err.kind(), "AuthenticationError");
    }

    #[test]
    fn test_unmatched_status_is_generic() {
        let err = GitLabError::classify(418, "", "teapot");
        assert_eq!(err.kind(), "GenericApiError");
        assert!(err.to_string().contains("418"));
    }

    #[test]
    fn test_parent_and_target_404_distinguishable() {
        let parent = GitLabError::classify(404, "", "project group/repo");
        let target = GitLabError::classify(404, "", "issue #7 of group/repo");

        assert_eq!(parent.kind(), "NotFoundError");
        assert_eq!(target.kind(), "NotFoundError");
        assert_ne!(parent.to_string(), target.to_string());
        assert!(parent.to_string().contains("project group/repo"));
        assert!(target.to_string().contains("issue #7"));
    }

    #[test]
    fn test_message_extraction() {
        let err = GitLabError::classify(429, r#"{"message": "Retry later"}"#, "search");
        assert!(err.to_string().contains("Retry later"));

        // Non-JSON body falls back to a generic message.
        let err = GitLabError::classify(500, "<html>oops</html>", "search");
        assert!(err.to_string().contains("remote failure"));
    }

    #[test]
    fn test_validation_is_local() {
        let err = GitLabError::Validation("branch_name must not be empty".to_string());
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("branch_name"));
    }
}
