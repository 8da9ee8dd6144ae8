use crate::application::group_service::GroupService;
use crate::domain::error::DomainError;
use crate::domain::input::GroupInput;
use crate::presentation::utils::{AuthenticatedUser, ensure_admin};
use actix_web::{HttpResponse, delete, get, post, web};
use tracing::info;

#[get("/groups")]
async fn list_groups(groups: web::Data<GroupService>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(groups.list_groups().await?))
}

#[post("/groups")]
async fn create_group(
    user: AuthenticatedUser,
    groups: web::Data<GroupService>,
    payload: web::Json<GroupInput>,
) -> Result<HttpResponse, DomainError> {
    ensure_admin(&user)?;
    let group = groups.create_group(payload.into_inner()).await?;
    info!(username = %user.username, slug = %group.slug, "group created");
    Ok(HttpResponse::Created().json(group))
}

#[delete("/groups/{slug}")]
async fn delete_group(
    user: AuthenticatedUser,
    groups: web::Data<GroupService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    ensure_admin(&user)?;
    let detached = groups.delete_group(&path).await?;
    info!(username = %user.username, slug = %path, detached, "group deleted");
    Ok(HttpResponse::NoContent().finish())
}
