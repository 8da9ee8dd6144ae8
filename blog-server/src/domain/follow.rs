use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Following,
    NotFollowing,
}

impl FollowState {
    pub fn is_following(self) -> bool {
        matches!(self, FollowState::Following)
    }
}

impl From<bool> for FollowState {
    fn from(exists: bool) -> Self {
        if exists {
            FollowState::Following
        } else {
            FollowState::NotFollowing
        }
    }
}
