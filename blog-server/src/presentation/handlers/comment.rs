use crate::application::comment_service::CommentService;
use crate::domain::error::DomainError;
use crate::domain::input::CommentInput;
use crate::presentation::handlers::post::detail_path;
use crate::presentation::utils::{AuthenticatedUser, request_id, see_other};
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;
use uuid::Uuid;

#[post("/posts/{id}/comments")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    payload: web::Json<CommentInput>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let comment = comments
        .add_comment(post_id, user.id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        comment_id = %comment.id,
        "comment added"
    );

    Ok(see_other(detail_path(post_id), &comment))
}
