use uuid::Uuid;

use crate::domain::post::Post;

/// Only the author may change a post.
pub fn can_edit(post: &Post, actor: Uuid) -> bool {
    post.author_id == actor
}

/// Outcome of the edit guard. A non-author is sent back to the read-only
/// view of the post instead of getting an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditDecision {
    Allow,
    ReadOnly,
}

pub fn edit_decision(post: &Post, actor: Uuid) -> EditDecision {
    if can_edit(post, actor) {
        EditDecision::Allow
    } else {
        EditDecision::ReadOnly
    }
}
