pub mod auth;
pub mod comment;
pub mod feed;
pub mod follow;
pub mod group;
pub mod health;
pub mod post;
