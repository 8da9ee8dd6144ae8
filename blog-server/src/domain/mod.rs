pub mod comment;
pub mod error;
pub mod follow;
pub mod group;
pub mod input;
pub mod page;
pub mod policy;
pub mod post;
pub mod user;
