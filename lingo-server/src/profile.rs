use chrono::Utc;

use lingo_common::non_api_structs::UserData;
use lingo_common::{FriendView, NewUser, ProfileUpdate, UserId, UserView};

use crate::error::{ApiError, Result};
use crate::notify;
use crate::store::State;

pub fn create_user(state: &State, payload: NewUser) -> Result<UserView> {
    let id = UserId::generate();
    let user = UserData {
        full_name: payload.full_name,
        bio: payload.bio,
        native_language: payload.native_language,
        learning_language: payload.learning_language,
        location: payload.location,
        avatar: payload.avatar,
        onboarded: payload.onboarded,
        friends: Default::default(),
        created_at: Utc::now(),
    };
    state.users.save(&id, &user)?;
    Ok(user.view(id))
}

/// Replaces the mutable profile fields and fans a rename out to the
/// user's friends. The old name is captured and compared before the
/// document is overwritten; notifications are inserted only after the
/// profile write lands.
pub fn update_profile(state: &State, actor: &UserId, payload: ProfileUpdate) -> Result<UserView> {
    let missing = payload.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let mut user = state.users.find_by_id(actor)?.ok_or(ApiError::NotFound)?;

    let old_name = user.full_name.clone();
    // validation above guarantees the required fields are present
    let new_name = payload.full_name.unwrap_or_default();
    let name_changed = new_name != old_name;

    user.full_name = new_name.clone();
    user.bio = payload.bio.unwrap_or_default();
    user.native_language = payload.native_language.unwrap_or_default();
    user.learning_language = payload.learning_language.unwrap_or_default();
    user.location = payload.location.unwrap_or_default();
    if let Some(avatar) = payload.avatar {
        user.avatar = Some(avatar);
    }
    state.users.save(actor, &user)?;

    if name_changed && !user.friends.is_empty() {
        notify::fanout_name_change(state, actor, &old_name, &new_name, &user.friends)?;
    }

    Ok(user.view(actor.clone()))
}

pub fn friends_of(state: &State, actor: &UserId) -> Result<Vec<FriendView>> {
    let user = state.users.find_by_id(actor)?.ok_or(ApiError::NotFound)?;
    let mut friends = Vec::new();
    for friend_id in &user.friends {
        if let Some(friend) = state.users.find_by_id(friend_id)? {
            friends.push(friend.friend_view(friend_id.clone()));
        }
    }
    Ok(friends)
}
