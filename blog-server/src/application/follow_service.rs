use std::sync::Arc;

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowState;
use crate::domain::user::User;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Follow relation between two users. Both transitions are idempotent and
/// a user can never follow themselves.
#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UserRepository>,
    repo: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UserRepository>, repo: Arc<dyn FollowRepository>) -> Self {
        Self { users, repo }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    pub async fn is_following(&self, follower: Uuid, author: Uuid) -> Result<bool, DomainError> {
        if follower == author {
            return Ok(false);
        }
        self.repo.exists(follower, author).await
    }

    pub async fn state(&self, follower: Uuid, author: Uuid) -> Result<FollowState, DomainError> {
        self.is_following(follower, author).await.map(FollowState::from)
    }

    #[instrument(skip(self))]
    pub async fn follow(
        &self,
        follower: Uuid,
        username: &str,
    ) -> Result<(User, FollowState), DomainError> {
        let author = self.author(username).await?;
        if follower == author.id {
            debug!("self-follow ignored");
            return Ok((author, FollowState::NotFollowing));
        }

        if !self.repo.exists(follower, author.id).await? {
            self.repo.insert(follower, author.id).await?;
        }
        Ok((author, FollowState::Following))
    }

    #[instrument(skip(self))]
    pub async fn unfollow(
        &self,
        follower: Uuid,
        username: &str,
    ) -> Result<(User, FollowState), DomainError> {
        let author = self.author(username).await?;
        if follower == author.id {
            debug!("self-unfollow ignored");
            return Ok((author, FollowState::NotFollowing));
        }

        self.repo.delete(follower, author.id).await?;
        Ok((author, FollowState::NotFollowing))
    }
}
