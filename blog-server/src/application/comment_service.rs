use std::sync::Arc;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::input::CommentInput;
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { repo, posts }
    }

    #[instrument(skip(self, input))]
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        input: CommentInput,
    ) -> Result<Comment, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        let text = input.validate()?;
        self.repo
            .create(Comment::new(post_id, author_id, text))
            .await
    }

    /// Comments of a post in the order they were written.
    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        self.repo.list_for_post(post_id).await
    }

    pub async fn count_comments(&self, post_id: Uuid) -> Result<u64, DomainError> {
        self.repo.count_for_post(post_id).await
    }
}
