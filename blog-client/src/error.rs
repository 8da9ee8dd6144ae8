use reqwest::{Response, StatusCode, header};
use serde::Deserialize;
use thiserror::Error;

/// Path the server redirects anonymous writes to.
pub(crate) const LOGIN_PATH: &str = "/api/auth/login";

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Token storage error: {0}")]
    TokenStorage(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Login required")]
    LoginRequired,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl BlogClientError {
    pub(crate) fn is_login_redirect(resp: &Response) -> bool {
        resp.status() == StatusCode::SEE_OTHER
            && resp
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|loc| loc.starts_with(LOGIN_PATH))
    }

    pub(crate) async fn from_http_response(resp: Response) -> Self {
        if Self::is_login_redirect(&resp) {
            return BlogClientError::LoginRequired;
        }

        let status = resp.status();
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => match body.details {
                Some(details) => format!("{} ({})", body.error, details),
                None => body.error,
            },
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };

        match status {
            StatusCode::NOT_FOUND => BlogClientError::NotFound(message),
            StatusCode::UNAUTHORIZED => BlogClientError::Unauthorized(message),
            StatusCode::BAD_REQUEST => BlogClientError::InvalidRequest(message),
            StatusCode::FORBIDDEN => BlogClientError::Forbidden,
            StatusCode::CONFLICT => BlogClientError::Conflict(message),
            status => BlogClientError::Status { status, message },
        }
    }
}
