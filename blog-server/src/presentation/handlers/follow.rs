use crate::application::follow_service::FollowService;
use crate::domain::error::DomainError;
use crate::domain::user::PublicUser;
use crate::presentation::dto::FollowResponse;
use crate::presentation::handlers::post::profile_path;
use crate::presentation::utils::{AuthenticatedUser, see_other};
use actix_web::{HttpResponse, post, web};
use tracing::info;

#[post("/profiles/{username}/follow")]
async fn follow(
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let (author, state) = follows.follow(user.id, &path).await?;
    info!(follower = %user.username, author = %author.username, ?state, "follow");

    Ok(see_other(
        profile_path(&author.username),
        &FollowResponse {
            author: PublicUser::from(&author),
            following: state.is_following(),
        },
    ))
}

#[post("/profiles/{username}/unfollow")]
async fn unfollow(
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let (author, state) = follows.unfollow(user.id, &path).await?;
    info!(follower = %user.username, author = %author.username, ?state, "unfollow");

    Ok(see_other(
        profile_path(&author.username),
        &FollowResponse {
            author: PublicUser::from(&author),
            following: state.is_following(),
        },
    ))
}
