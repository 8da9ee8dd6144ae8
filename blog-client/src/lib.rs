//! HTTP client for the blog server's `/api` surface.

mod error;
mod http_client;
pub mod models;

pub use error::BlogClientError;
pub use http_client::BlogClientHttp;
pub use models::{
    Comment, FollowResponse, Group, GroupFeed, NewGroup, NewPost, Page, Post, PostDetail,
    ProfileFeed, PublicUser,
};
