use crate::error::BlogClientError;
use crate::models::{
    AuthResponse, Comment, FollowResponse, Group, GroupFeed, NewGroup, NewPost, Page, Post,
    PostDetail, ProfileFeed, PublicUser,
};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_TOKEN_FILE: &str = ".blog_token";

#[derive(Clone)]
pub struct BlogClientHttp {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
    token_file: PathBuf,
}

impl BlogClientHttp {
    pub async fn connect(endpoint: &str) -> Result<Self, BlogClientError> {
        Self::with_token_file(endpoint, DEFAULT_TOKEN_FILE)
    }

    /// Builds a client that keeps its token in `token_file` and picks up
    /// whatever a previous login left there.
    pub fn with_token_file(
        endpoint: &str,
        token_file: impl AsRef<Path>,
    ) -> Result<Self, BlogClientError> {
        let token_file = token_file.as_ref().to_path_buf();
        let token = fs::read_to_string(&token_file)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        // the server answers writes with 303; the body is what we want
        let client = Client::builder().redirect(Policy::none()).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: endpoint.trim_end_matches('/').to_string(),
            token,
            token_file,
        })
    }

    pub fn set_token(&mut self, token: String) -> Result<(), BlogClientError> {
        fs::write(&self.token_file, &token)?;
        self.token = Some(token);
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) -> Result<(), BlogClientError> {
        self.token = None;
        match fs::remove_file(&self.token_file) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    fn paged(req: RequestBuilder, page: Option<i64>) -> RequestBuilder {
        match page {
            Some(page) => req.query(&[("page", page)]),
            None => req,
        }
    }

    async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, BlogClientError> {
        let redirect_ok =
            resp.status() == StatusCode::SEE_OTHER && !BlogClientError::is_login_redirect(&resp);
        if resp.status().is_success() || redirect_ok {
            Ok(resp.json().await?)
        } else {
            Err(BlogClientError::from_http_response(resp).await)
        }
    }

    async fn expect_empty(resp: Response) -> Result<(), BlogClientError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BlogClientError::from_http_response(resp).await)
        }
    }

    async fn authenticate(&mut self, resp: Response) -> Result<PublicUser, BlogClientError> {
        let auth: AuthResponse = Self::read(resp).await?;
        self.set_token(auth.access_token)?;
        Ok(auth.user)
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        self.authenticate(resp).await
    }

    /// `login` is a username or an email address.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<PublicUser, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "login": login,
                "password": password,
            }))
            .send()
            .await?;
        self.authenticate(resp).await
    }

    pub async fn list_posts(&self, page: Option<i64>) -> Result<Page<Post>, BlogClientError> {
        let req = Self::paged(self.client.get(self.url("/posts")), page);
        Self::read(req.send().await?).await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostDetail, BlogClientError> {
        let resp = self.client.get(self.url(&format!("/posts/{id}"))).send().await?;
        Self::read(resp).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, BlogClientError> {
        let req = self.authorized(self.client.post(self.url("/posts")));
        Self::read(req.json(post).send().await?).await
    }

    /// Returns the post as stored afterwards. Editing someone else's post
    /// leaves it unchanged.
    pub async fn update_post(&self, id: Uuid, post: &NewPost) -> Result<Post, BlogClientError> {
        let req = self.authorized(self.client.put(self.url(&format!("/posts/{id}"))));
        Self::read(req.json(post).send().await?).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), BlogClientError> {
        let req = self.authorized(self.client.delete(self.url(&format!("/posts/{id}"))));
        Self::expect_empty(req.send().await?).await
    }

    pub async fn add_comment(&self, post_id: Uuid, text: &str) -> Result<Comment, BlogClientError> {
        let req = self.authorized(
            self.client
                .post(self.url(&format!("/posts/{post_id}/comments"))),
        );
        let resp = req
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn group_posts(
        &self,
        slug: &str,
        page: Option<i64>,
    ) -> Result<GroupFeed, BlogClientError> {
        let req = Self::paged(self.client.get(self.url(&format!("/groups/{slug}/posts"))), page);
        Self::read(req.send().await?).await
    }

    pub async fn profile_posts(
        &self,
        username: &str,
        page: Option<i64>,
    ) -> Result<ProfileFeed, BlogClientError> {
        let req = self.authorized(
            self.client
                .get(self.url(&format!("/profiles/{username}/posts"))),
        );
        Self::read(Self::paged(req, page).send().await?).await
    }

    pub async fn follow_posts(&self, page: Option<i64>) -> Result<Page<Post>, BlogClientError> {
        let req = self.authorized(self.client.get(self.url("/follow/posts")));
        Self::read(Self::paged(req, page).send().await?).await
    }

    pub async fn follow(&self, username: &str) -> Result<FollowResponse, BlogClientError> {
        let req = self.authorized(
            self.client
                .post(self.url(&format!("/profiles/{username}/follow"))),
        );
        Self::read(req.send().await?).await
    }

    pub async fn unfollow(&self, username: &str) -> Result<FollowResponse, BlogClientError> {
        let req = self.authorized(
            self.client
                .post(self.url(&format!("/profiles/{username}/unfollow"))),
        );
        Self::read(req.send().await?).await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, BlogClientError> {
        let resp = self.client.get(self.url("/groups")).send().await?;
        Self::read(resp).await
    }

    pub async fn create_group(&self, group: &NewGroup) -> Result<Group, BlogClientError> {
        let req = self.authorized(self.client.post(self.url("/groups")));
        Self::read(req.json(group).send().await?).await
    }

    pub async fn delete_group(&self, slug: &str) -> Result<(), BlogClientError> {
        let req = self.authorized(self.client.delete(self.url(&format!("/groups/{slug}"))));
        Self::expect_empty(req.send().await?).await
    }

    pub async fn clear_cache(&self) -> Result<(), BlogClientError> {
        let req = self.authorized(self.client.post(self.url("/cache/clear")));
        Self::expect_empty(req.send().await?).await
    }
}
