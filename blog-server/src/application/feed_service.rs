use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::follow_service::FollowService;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::page::{Page, PageRequest};
use crate::domain::post::{Post, PostFilter};
use crate::domain::user::PublicUser;
use crate::infrastructure::cache::{CacheKey, PageCache};

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: PublicUser,
    pub page: Page<Post>,
    /// Whether the viewer follows this author. Always false for anonymous
    /// viewers and for one's own profile.
    pub following: bool,
}

/// Read side: every listing of posts goes through here.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: FollowService,
    cache: Arc<dyn PageCache>,
    cache_ttl: Duration,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: FollowService,
        cache: Arc<dyn PageCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            cache,
            cache_ttl,
        }
    }

    async fn paginate(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count_posts(filter).await?;
        let window = page.resolve(total);
        let items = self
            .posts
            .get_posts(filter, window.limit, window.offset)
            .await?;
        Ok(Page::new(items, window, total))
    }

    /// Served from the page cache while the cached copy is fresh.
    #[instrument(skip(self))]
    pub async fn global_feed(&self, page: PageRequest) -> Result<Page<Post>, DomainError> {
        let key = CacheKey::global(page);
        if let Some(cached) = self.cache.get(&key) {
            debug!("global feed served from cache");
            return Ok(cached);
        }

        let fresh = self.paginate(PostFilter::All, page).await?;
        self.cache.set(key, fresh.clone(), self.cache_ttl);
        Ok(fresh)
    }

    #[instrument(skip(self))]
    pub async fn group_feed(&self, slug: &str, page: PageRequest) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.paginate(PostFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    #[instrument(skip(self))]
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;

        let following = match viewer {
            Some(viewer) => self.follows.is_following(viewer, author.id).await?,
            None => false,
        };
        let page = self.paginate(PostFilter::Author(author.id), page).await?;

        Ok(ProfileFeed {
            author: PublicUser::from(&author),
            page,
            following,
        })
    }

    /// Posts by everyone the viewer follows; an empty page when that is
    /// nobody.
    #[instrument(skip(self))]
    pub async fn follower_feed(
        &self,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        let viewer = viewer.ok_or(DomainError::Unauthorized)?;
        self.paginate(PostFilter::FollowedBy(viewer), page).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("feed cache cleared");
    }
}
