//! In-process store used by the test-suite and by database-less runs.
//! It keeps the same uniqueness, ordering and delete rules as the
//! PostgreSQL schema.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::input::ValidPost;
use crate::domain::post::{Post, PostFilter};
use crate::domain::user::User;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    /// Insertion order, oldest first.
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&(user_id, post.author_id)),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(
                "email already registered".to_string(),
            ));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(
                "username already taken".to_string(),
            ));
        }
        tables.users.push(user.clone());

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        tables.groups.push(group.clone());

        info!(group_id = %group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn delete(&self, slug: &str) -> Result<Option<u64>, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.groups.iter().position(|g| g.slug == slug) else {
            return Ok(None);
        };
        let group = tables.groups.remove(index);

        let mut detached = 0;
        for post in tables.posts.iter_mut().filter(|p| p.group_id == Some(group.id)) {
            post.group_id = None;
            detached += 1;
        }

        info!(group_id = %group.id, slug = %slug, detached, "group deleted");
        Ok(Some(detached))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        tables.posts.push(post.clone());

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        update: ValidPost,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.author_id == author_id)
        else {
            return Ok(None);
        };

        post.text = update.text;
        post.group_id = update.group_id;
        if let Some(image) = update.image {
            post.image = Some(image);
        }

        info!(post_id = %id, "post updated");
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }

        let comments_before = tables.comments.len();
        tables.comments.retain(|c| c.post_id != id);
        let comments = comments_before - tables.comments.len();

        info!(post_id = %id, comments, "post deleted");
        Ok(true)
    }

    async fn get_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let tables = self.tables.read().await;
        // Reverse first so the stable sort keeps later inserts ahead of
        // earlier ones sharing a timestamp.
        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| tables.matches(p, filter))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .count() as u64)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        tables.comments.push(comment.clone());

        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().filter(|c| c.post_id == post_id).count() as u64)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.contains(&(user_id, author_id)))
    }

    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        if user_id == author_id {
            return Err(DomainError::Internal(
                "follows check constraint: user_id <> author_id".to_string(),
            ));
        }
        let mut tables = self.tables.write().await;
        let inserted = tables.follows.insert((user_id, author_id));
        if inserted {
            info!(user_id = %user_id, author_id = %author_id, "follow created");
        }
        Ok(inserted)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let deleted = tables.follows.remove(&(user_id, author_id));
        if deleted {
            info!(user_id = %user_id, author_id = %author_id, "follow deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn post_at(author: Uuid, text: &str, minutes_ago: i64) -> Post {
        let mut post = Post::new(author, text.to_string(), None, None);
        post.created_at = Utc::now() - Duration::minutes(minutes_ago);
        post
    }

    #[tokio::test]
    async fn posts_come_back_newest_first() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        PostRepository::create(&store, post_at(author, "old", 30)).await.unwrap();
        PostRepository::create(&store, post_at(author, "new", 1)).await.unwrap();
        PostRepository::create(&store, post_at(author, "middle", 10)).await.unwrap();

        let posts = store.get_posts(PostFilter::All, 10, 0).await.unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["new", "middle", "old"]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_latest_insert_first() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        let first = post_at(author, "first", 5);
        let mut second = post_at(author, "second", 5);
        second.created_at = first.created_at;
        PostRepository::create(&store, first).await.unwrap();
        PostRepository::create(&store, second).await.unwrap();

        let posts = store.get_posts(PostFilter::All, 10, 0).await.unwrap();
        assert_eq!(posts[0].text, "second");
        assert_eq!(posts[1].text, "first");
    }

    #[tokio::test]
    async fn deleting_group_detaches_posts() {
        let store = MemoryStore::new();
        let group = GroupRepository::create(
            &store,
            Group::new("Cats".into(), "cats".into(), String::new()),
        )
        .await
        .unwrap();
        let post = Post::new(Uuid::new_v4(), "meow".into(), Some(group.id), None);
        PostRepository::create(&store, post.clone()).await.unwrap();

        assert_eq!(GroupRepository::delete(&store, "cats").await.unwrap(), Some(1));
        let kept = PostRepository::find_by_id(&store, post.id).await.unwrap().unwrap();
        assert_eq!(kept.group_id, None);
        assert_eq!(GroupRepository::delete(&store, "cats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_post_removes_its_comments() {
        let store = MemoryStore::new();
        let post = Post::new(Uuid::new_v4(), "text".into(), None, None);
        PostRepository::create(&store, post.clone()).await.unwrap();
        CommentRepository::create(&store, Comment::new(post.id, Uuid::new_v4(), "hi".into()))
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert_eq!(store.count_for_post(post.id).await.unwrap(), 0);
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let store = MemoryStore::new();
        let group = Group::new("Cats".into(), "cats".into(), String::new());
        GroupRepository::create(&store, group.clone()).await.unwrap();
        let err = GroupRepository::create(&store, Group::new("Other".into(), "cats".into(), String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::GroupAlreadyExists(_)));
    }

    #[tokio::test]
    async fn email_lookup_is_exact() {
        let store = MemoryStore::new();
        let user = User::new("mark".into(), "mark@mark.com".into(), "hash".into(), false);
        UserRepository::create(&store, user).await.unwrap();

        assert!(store.find_by_email("mark@mark.com").await.unwrap().is_some());
        assert!(store.find_by_email("MARK@mark.com").await.unwrap().is_none());
    }
}
