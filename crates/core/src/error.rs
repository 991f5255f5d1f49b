//! Error classification shared by every component.

use serde::{Deserialize, Serialize};

/// Failure class of an error, independent of which component raised it.
///
/// The orchestrator decides what to do with a failure from its kind alone:
/// configuration problems abort the run, transient remote errors are retried
/// where a retry policy applies, everything else ends the current asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing credentials or identifiers. Fatal before any remote call.
    Configuration,
    /// Catalog folder missing or empty.
    NotFound,
    /// Network or platform error that may succeed on a later attempt.
    TransientRemote,
    /// Unsupported file type or size, missing local file.
    Validation,
    /// External probe/trim tool missing or failing.
    ToolFailure,
    /// Key-value store unreachable.
    CacheUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransientRemote => "transient_remote",
            ErrorKind::Validation => "validation",
            ErrorKind::ToolFailure => "tool_failure",
            ErrorKind::CacheUnavailable => "cache_unavailable",
        }
    }

    /// Whether errors of this kind abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a reqwest transport error onto a kind.
///
/// Timeouts and connection failures are transient; request-building and body
/// decoding problems are not going to fix themselves on retry.
pub(crate) fn classify_reqwest(e: &reqwest::Error) -> ErrorKind {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ErrorKind::TransientRemote
    } else if e.is_decode() || e.is_builder() {
        ErrorKind::Validation
    } else if let Some(status) = e.status() {
        classify_status(status.as_u16())
    } else {
        ErrorKind::TransientRemote
    }
}

/// Map an HTTP status onto a kind.
pub(crate) fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Configuration,
        404 => ErrorKind::NotFound,
        408 | 429 => ErrorKind::TransientRemote,
        s if s >= 500 => ErrorKind::TransientRemote,
        _ => ErrorKind::Validation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(ErrorKind::Configuration.is_fatal());
        assert!(!ErrorKind::TransientRemote.is_fatal());
        assert!(!ErrorKind::CacheUnavailable.is_fatal());
        assert!(!ErrorKind::NotFound.is_fatal());
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(503), ErrorKind::TransientRemote);
        assert_eq!(classify_status(429), ErrorKind::TransientRemote);
        assert_eq!(classify_status(401), ErrorKind::Configuration);
        assert_eq!(classify_status(404), ErrorKind::NotFound);
        assert_eq!(classify_status(400), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_transient() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = reqwest::get(server.uri())
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap_err();

        assert!(err.is_decode());
        assert_eq!(classify_reqwest(&err), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ToolFailure).unwrap();
        assert_eq!(json, "\"tool_failure\"");
        assert_eq!(ErrorKind::ToolFailure.to_string(), "tool_failure");
    }
}
