use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::domain::input::Registration;
use crate::domain::user::PublicUser;
use crate::presentation::dto::{AuthResponse, LoginRequest};
use actix_web::{HttpResponse, Responder, Scope, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth").service(register).service(login)
}

#[post("/register")]
async fn register(
    service: web::Data<AuthService>,
    payload: web::Json<Registration>,
) -> Result<impl Responder, DomainError> {
    let user = service.register(&payload).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");

    let (user, jwt) = service.login(&user.username, &payload.password).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: jwt,
        expires_in: service.keys().ttl_secs(),
        token_type: "Bearer".to_string(),
        user: PublicUser::from(&user),
    }))
}

#[post("/login")]
async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let identifier = payload.identifier().ok_or_else(|| {
        DomainError::validation("login", "username or email is required", &payload.login)
    })?;
    let (user, jwt) = service.login(identifier, &payload.password).await?;

    info!(user_id = %user.id, username = %user.username, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: service.keys().ttl_secs(),
        token_type: "Bearer".to_string(),
        user: PublicUser::from(&user),
    }))
}
