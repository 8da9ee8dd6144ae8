use crate::application::feed_service::FeedService;
use crate::domain::error::DomainError;
use crate::domain::page::PageRequest;
use crate::presentation::dto::PageQuery;
use crate::presentation::utils::{AuthenticatedUser, MaybeUser, ensure_admin};
use actix_web::{HttpResponse, get, post, web};
use tracing::info;

#[get("/groups/{slug}/posts")]
async fn group_posts(
    feeds: web::Data<FeedService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let feed = feeds
        .group_feed(&path, PageRequest::parse(query.page.as_deref()))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[get("/profiles/{username}/posts")]
async fn profile_posts(
    viewer: MaybeUser,
    feeds: web::Data<FeedService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let feed = feeds
        .profile_feed(&path, viewer.id(), PageRequest::parse(query.page.as_deref()))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[get("/follow/posts")]
async fn follow_posts(
    user: AuthenticatedUser,
    feeds: web::Data<FeedService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = feeds
        .follower_feed(Some(user.id), PageRequest::parse(query.page.as_deref()))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/cache/clear")]
async fn clear_cache(
    user: AuthenticatedUser,
    feeds: web::Data<FeedService>,
) -> Result<HttpResponse, DomainError> {
    ensure_admin(&user)?;
    feeds.clear_cache();
    info!(username = %user.username, "feed cache cleared");
    Ok(HttpResponse::NoContent().finish())
}
