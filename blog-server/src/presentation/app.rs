use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use sqlx::PgPool;

use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::feed_service::FeedService;
use crate::application::follow_service::FollowService;
use crate::application::group_service::GroupService;
use crate::application::post_service::PostService;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::follow_repository::{FollowRepository, PostgresFollowRepository};
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::MemoryStore;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::cache::PageCache;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::JwtAuthMiddleware;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            follows: Arc::new(PostgresFollowRepository::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub groups: GroupService,
    pub follows: FollowService,
    pub feeds: FeedService,
}

impl Services {
    pub fn new(
        repos: Repositories,
        keys: JwtKeys,
        admins: Vec<String>,
        cache: Arc<dyn PageCache>,
        cache_ttl: Duration,
    ) -> Self {
        let follows = FollowService::new(repos.users.clone(), repos.follows.clone());
        Self {
            auth: AuthService::new(repos.users.clone(), keys).with_admins(admins),
            posts: PostService::new(repos.posts.clone(), repos.groups.clone()),
            comments: CommentService::new(repos.comments.clone(), repos.posts.clone()),
            groups: GroupService::new(repos.groups.clone()),
            feeds: FeedService::new(
                repos.posts.clone(),
                repos.groups.clone(),
                repos.users.clone(),
                follows.clone(),
                cache,
                cache_ttl,
            ),
            follows,
        }
    }
}

/// Registers shared state and every `/api` route. Handlers that take an
/// `AuthenticatedUser` require a signed-in caller.
pub fn configure_api(cfg: &mut web::ServiceConfig, services: &Services) {
    cfg.app_data(web::Data::new(services.auth.clone()))
        .app_data(web::Data::new(services.posts.clone()))
        .app_data(web::Data::new(services.comments.clone()))
        .app_data(web::Data::new(services.groups.clone()))
        .app_data(web::Data::new(services.follows.clone()))
        .app_data(web::Data::new(services.feeds.clone()))
        .service(
            web::scope("/api")
                .wrap(JwtAuthMiddleware::new(services.auth.keys().clone()))
                .service(handlers::health::health)
                .service(handlers::auth::scope())
                .service(handlers::post::get_posts)
                .service(handlers::post::get_post)
                .service(handlers::post::create_post)
                .service(handlers::post::update_post)
                .service(handlers::post::delete_post)
                .service(handlers::comment::add_comment)
                .service(handlers::group::list_groups)
                .service(handlers::group::create_group)
                .service(handlers::group::delete_group)
                .service(handlers::feed::group_posts)
                .service(handlers::feed::profile_posts)
                .service(handlers::feed::follow_posts)
                .service(handlers::feed::clear_cache)
                .service(handlers::follow::follow)
                .service(handlers::follow::unfollow),
        );
}
