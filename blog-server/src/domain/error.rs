use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(Uuid),
    #[error("{0}")]
    Validation(ValidationError),
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("login required")]
    LoginRequired { next: String },
    #[error("internal error: {0}")]
    Internal(String),
}

/// A rejected field together with the input that was submitted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
    pub input: serde_json::Value,
}

impl DomainError {
    pub fn validation(
        field: &'static str,
        message: impl Into<String>,
        input: impl Serialize,
    ) -> Self {
        DomainError::Validation(ValidationError {
            field,
            message: message.into(),
            input: serde_json::to_value(input).unwrap_or(serde_json::Value::Null),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_)
                | DomainError::GroupNotFound(_)
                | DomainError::PostNotFound(_)
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

pub const LOGIN_PATH: &str = "/api/auth/login";

/// Login URL that sends the caller back to `next` afterwards.
pub fn login_location(next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) | DomainError::GroupAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::UserNotFound(resource) | DomainError::GroupNotFound(resource) => {
                Some(json!({ "resource": resource }))
            }
            DomainError::Validation(err) => Some(json!({
                "field": err.field,
                "message": err.message,
                "input": err.input,
            })),
            DomainError::Forbidden => {
                Some(json!({ "message": "only the author may change this post" }))
            }
            DomainError::LoginRequired { next } => Some(json!({ "next": next })),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };

        let mut response = HttpResponse::build(self.status_code());
        if let DomainError::LoginRequired { next } = self {
            response.insert_header((header::LOCATION, login_location(next)));
        }
        response.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            DomainError::PostNotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::GroupNotFound("cats".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert!(DomainError::UserNotFound("mark".into()).is_not_found());
    }

    #[test]
    fn login_required_redirects_with_next() {
        let response = DomainError::LoginRequired {
            next: "/api/follow/posts".into(),
        }
        .error_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/auth/login?next=%2Fapi%2Ffollow%2Fposts"
        );
    }

    #[test]
    fn login_location_keeps_whole_query_in_next() {
        let location = login_location("/api/follow/posts?page=2&x=1");
        assert_eq!(
            location,
            "/api/auth/login?next=%2Fapi%2Ffollow%2Fposts%3Fpage%3D2%26x%3D1"
        );

        let (_, query) = location.split_once('?').unwrap();
        let params: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            params,
            vec![("next".to_string(), "/api/follow/posts?page=2&x=1".to_string())]
        );
    }

    #[test]
    fn validation_keeps_rejected_input() {
        let err = DomainError::validation("text", "must not be empty", "   ");
        match err {
            DomainError::Validation(v) => {
                assert_eq!(v.field, "text");
                assert_eq!(v.input, json!("   "));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
