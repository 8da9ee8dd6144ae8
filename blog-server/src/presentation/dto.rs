use crate::domain::comment::Comment;
use crate::domain::post::Post;
use crate::domain::user::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
}

impl LoginRequest {
    pub fn identifier(&self) -> Option<&str> {
        self.login
            .as_deref()
            .or(self.email.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
    pub user: PublicUser,
}

// ======================= POSTS =======================

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: Post,
    pub comments: Vec<Comment>,
}

// ======================= FOLLOWS =======================

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub author: PublicUser,
    pub following: bool,
}

// ======================= Utils =======================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
