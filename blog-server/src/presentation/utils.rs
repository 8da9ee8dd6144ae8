use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, error::ErrorUnauthorized,
};
use futures_util::future::{Ready, ready};
use serde::Serialize;
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::middleware::RequestId;

pub fn ensure_admin(user: &AuthenticatedUser) -> Result<(), DomainError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// 303 with a JSON body, so API clients that don't follow redirects
/// still see the result.
pub fn see_other<T: Serialize>(location: String, body: &T) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(body)
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// What the `Authorization` header of a request holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Missing,
    Malformed,
    Bearer(String),
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Credentials::Missing;
        };
        value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Credentials::Bearer(t.to_string()))
            .unwrap_or(Credentials::Malformed)
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

/// Who the caller is, as resolved by `JwtAuthMiddleware` from the
/// `Authorization` header.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    /// A token was sent but it is malformed, expired or names no user.
    Rejected,
    User(AuthenticatedUser),
}

fn current_path(req: &HttpRequest) -> String {
    match req.query_string() {
        "" => req.path().to_owned(),
        query => format!("{}?{}", req.path(), query),
    }
}

/// Requires a signed-in caller. Anonymous callers are sent to the login
/// page with the current path as `next`; a bad token is a 401.
impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<Identity>() {
            Some(Identity::User(user)) => Ok(user.clone()),
            Some(Identity::Rejected) => Err(DomainError::Unauthorized.into()),
            Some(Identity::Anonymous) | None => Err(DomainError::LoginRequired {
                next: current_path(req),
            }
            .into()),
        };
        ready(result)
    }
}

/// The signed-in user if the request carries a valid token, otherwise
/// nobody. Never rejects the request.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = match req.extensions().get::<Identity>() {
            Some(Identity::User(user)) => Some(user.clone()),
            _ => None,
        };
        ready(Ok(MaybeUser(user)))
    }
}

pub async fn extract_user_from_token(
    token: &str,
    keys: &JwtKeys,
    auth_service: &AuthService,
) -> Result<AuthenticatedUser, Error> {
    let claims = keys
        .verify_token(token)
        .map_err(|_| ErrorUnauthorized("invalid token"))?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ErrorUnauthorized("invalid token"))?;

    let user = auth_service
        .get_user(user_id)
        .await
        .map_err(|_| ErrorUnauthorized("user not found"))?;

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    })
}
