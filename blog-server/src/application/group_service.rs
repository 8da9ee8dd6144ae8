use std::sync::Arc;

use crate::data::group_repository::GroupRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::input::GroupInput;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        self.repo.list().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group, DomainError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_group(&self, input: GroupInput) -> Result<Group, DomainError> {
        let valid = input.validate()?;
        self.repo
            .create(Group::new(valid.title, valid.slug, valid.description))
            .await
    }

    /// Posts of the group survive with their group cleared.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, slug: &str) -> Result<u64, DomainError> {
        let detached = self
            .repo
            .delete(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        info!(slug = %slug, detached, "posts detached from deleted group");
        Ok(detached)
    }
}
