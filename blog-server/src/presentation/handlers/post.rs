use crate::application::comment_service::CommentService;
use crate::application::feed_service::FeedService;
use crate::application::post_service::{EditOutcome, PostService};
use crate::domain::error::DomainError;
use crate::domain::input::PostInput;
use crate::domain::page::PageRequest;
use crate::presentation::dto::{PageQuery, PostDetailResponse};
use crate::presentation::utils::{AuthenticatedUser, request_id, see_other};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

pub fn detail_path(id: Uuid) -> String {
    format!("/api/posts/{}", id)
}

pub fn profile_path(username: &str) -> String {
    format!("/api/profiles/{}/posts", username)
}

#[get("/posts")]
async fn get_posts(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = feeds
        .global_feed(PageRequest::parse(query.page.as_deref()))
        .await?;

    info!(
        request_id = %request_id(&req),
        page = page.number,
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/{id}")]
async fn get_post(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    let comments = comments.list_comments(post.id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse { post, comments }))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostInput>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.create_post(user.id, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post created"
    );

    Ok(see_other(profile_path(&user.username), &post))
}

#[put("/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostInput>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let outcome = posts
        .edit_post(post_id, user.id, payload.into_inner())
        .await?;

    match &outcome {
        EditOutcome::Updated(_) => info!(
            request_id = %request_id(&req),
            username = %user.username,
            post_id = %post_id,
            "post updated"
        ),
        EditOutcome::ReadOnly(_) => info!(
            request_id = %request_id(&req),
            username = %user.username,
            post_id = %post_id,
            "edit refused, not the author"
        ),
    }

    Ok(see_other(detail_path(post_id), outcome.post()))
}

#[delete("/posts/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(post_id, user.id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
