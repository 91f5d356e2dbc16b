use std::error::Error as StdError;
use std::fmt;

const BODY_SNIPPET_CHARS: usize = 200;

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS failure, refused connection, timeout, or a body that could not be read.
    NetworkFailure,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// A 2xx answer whose body did not have the expected shape.
    MalformedResponse,
    /// The worker running the request panicked.
    Internal,
}

/// Typed failure produced by the request operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NetworkFailure { message: String },
    HttpStatus { code: u16, body: String },
    MalformedResponse { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::NetworkFailure {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Builds an HTTP status error, keeping only a bounded snippet of the body.
    pub fn http_status(code: u16, body: &str) -> Self {
        ApiError::HttpStatus {
            code,
            body: body_snippet(body),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            ApiError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            ApiError::network(format!("could not connect: {err}"))
        } else {
            ApiError::network(err.to_string())
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NetworkFailure { message } => write!(f, "Network error: {message}"),
            ApiError::HttpStatus { code, body } => match summarize_error_body(body) {
                Some(summary) => write!(f, "HTTP {code}: {summary}"),
                None if body.trim().is_empty() => write!(f, "HTTP {code}"),
                None => write!(f, "HTTP {code}: {}", body.trim()),
            },
            ApiError::MalformedResponse { message } => {
                write!(f, "Unexpected response: {message}")
            }
            ApiError::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl StdError for ApiError {}

fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let mut snippet: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    snippet.push('…');
    snippet
}

/// Pulls the human-readable message out of the usual JSON error envelopes:
/// `{"error": {"message": ...}}`, `{"error": "..."}` or `{"message": ...}`.
fn summarize_error_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
