use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FriendView, UserId, UserView};

/// The persisted user document. Server-side shape, keyed by [`UserId`]
/// in the store; not part of the HTTP contract.
///
/// `friends` is a set: insertion is idempotent and order carries no
/// meaning. Both sides of an accepted friendship list each other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserData {
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub avatar: Option<String>,
    pub onboarded: bool,
    pub friends: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl UserData {
    pub fn view(&self, id: UserId) -> UserView {
        UserView {
            id,
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            native_language: self.native_language.clone(),
            learning_language: self.learning_language.clone(),
            location: self.location.clone(),
            avatar: self.avatar.clone(),
            onboarded: self.onboarded,
            friends: self.friends.iter().cloned().collect(),
        }
    }

    pub fn friend_view(&self, id: UserId) -> FriendView {
        FriendView {
            id,
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            native_language: self.native_language.clone(),
            learning_language: self.learning_language.clone(),
        }
    }
}
