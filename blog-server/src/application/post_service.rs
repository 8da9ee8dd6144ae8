use std::sync::Arc;

use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::input::{PostInput, ValidPost};
use crate::domain::policy::{EditDecision, can_edit, edit_decision};
use crate::domain::{error::DomainError, post::Post};
use tracing::{info, instrument};
use uuid::Uuid;

/// Result of an edit attempt. A non-author gets the untouched post back
/// and is expected to be shown the read-only view.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Updated(Post),
    ReadOnly(Post),
}

impl EditOutcome {
    pub fn post(&self) -> &Post {
        match self {
            EditOutcome::Updated(post) | EditOutcome::ReadOnly(post) => post,
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { repo, groups }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// Field validation shared by create and edit.
    async fn clean(&self, input: &PostInput) -> Result<ValidPost, DomainError> {
        let valid = input.validate()?;
        if let Some(group_id) = valid.group_id {
            if self.groups.find_by_id(group_id).await?.is_none() {
                return Err(DomainError::validation(
                    "group",
                    "select a valid group",
                    group_id,
                ));
            }
        }
        Ok(valid)
    }

    #[instrument(skip(self, input))]
    pub async fn create_post(&self, author_id: Uuid, input: PostInput) -> Result<Post, DomainError> {
        let valid = self.clean(&input).await?;
        let post = Post::new(author_id, valid.text, valid.group_id, valid.image);
        self.repo.create(post).await
    }

    #[instrument(skip(self, input))]
    pub async fn edit_post(
        &self,
        post_id: Uuid,
        actor: Uuid,
        input: PostInput,
    ) -> Result<EditOutcome, DomainError> {
        let post = self.get_post(post_id).await?;
        if edit_decision(&post, actor) == EditDecision::ReadOnly {
            info!(post_id = %post_id, actor = %actor, "edit by non-author ignored");
            return Ok(EditOutcome::ReadOnly(post));
        }

        let valid = self.clean(&input).await?;
        match self.repo.update_post(post_id, actor, valid).await? {
            Some(post) => Ok(EditOutcome::Updated(post)),
            None => Err(DomainError::PostNotFound(post_id)),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, post_id: Uuid, actor: Uuid) -> Result<(), DomainError> {
        let post = self.get_post(post_id).await?;
        if !can_edit(&post, actor) {
            return Err(DomainError::Forbidden);
        }
        if !self.repo.delete_post(post_id).await? {
            return Err(DomainError::PostNotFound(post_id));
        }
        Ok(())
    }
}
