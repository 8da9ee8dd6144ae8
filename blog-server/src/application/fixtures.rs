use std::sync::Arc;
use std::time::Duration;

use crate::application::comment_service::CommentService;
use crate::application::feed_service::FeedService;
use crate::application::follow_service::FollowService;
use crate::application::group_service::GroupService;
use crate::application::post_service::PostService;
use crate::data::memory::MemoryStore;
use crate::data::user_repository::UserRepository;
use crate::domain::user::User;
use crate::infrastructure::cache::MemoryPageCache;

/// Services wired to one shared in-memory store.
pub(crate) struct Harness {
    pub store: MemoryStore,
    pub posts: PostService,
    pub comments: CommentService,
    pub groups: GroupService,
    pub follows: FollowService,
    pub feeds: FeedService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(60))
    }

    pub fn with_cache_ttl(ttl: Duration) -> Self {
        let store = MemoryStore::new();
        let repo = Arc::new(store.clone());
        let follows = FollowService::new(repo.clone(), repo.clone());

        Self {
            posts: PostService::new(repo.clone(), repo.clone()),
            comments: CommentService::new(repo.clone(), repo.clone()),
            groups: GroupService::new(repo.clone()),
            feeds: FeedService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                follows.clone(),
                Arc::new(MemoryPageCache::new()),
                ttl,
            ),
            follows,
            store,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username.to_lowercase()),
            "not-a-real-hash".to_string(),
            false,
        );
        UserRepository::create(&self.store, user).await.unwrap()
    }
}
