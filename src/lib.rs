pub mod non_api_structs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserId(pub String);
impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct RequestId(pub String);
impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Eq, PartialEq, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct NotificationId(pub String);
impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

/// A friend-request document. One per unordered user pair, in either
/// direction, never deleted. The only transition is pending -> accepted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FriendRequest {
    pub id: RequestId,
    pub sender: UserId,
    pub recipient: UserId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub sender: UserId,
    pub recipient: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a user. Registration proper (credentials,
/// sessions) lives outside this service; this is the profile seed.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NewUser {
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub avatar: Option<String>,
    pub onboarded: bool,
}

/// Profile-update payload. Every field except `avatar` is required;
/// absent or empty values are reported together in one validation pass.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn absent(field: &Option<String>) -> bool {
            field.as_deref().map_or(true, |s| s.is_empty())
        }
        let mut missing = Vec::new();
        if absent(&self.full_name) {
            missing.push("full_name");
        }
        if absent(&self.bio) {
            missing.push("bio");
        }
        if absent(&self.native_language) {
            missing.push("native_language");
        }
        if absent(&self.learning_language) {
            missing.push("learning_language");
        }
        if absent(&self.location) {
            missing.push("location");
        }
        missing
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: UserId,
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub avatar: Option<String>,
    pub onboarded: bool,
    pub friends: Vec<UserId>,
}

/// The subset of a profile shown on friend cards and request lists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FriendView {
    pub id: UserId,
    pub full_name: String,
    pub avatar: Option<String>,
    pub native_language: String,
    pub learning_language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestWithSender {
    pub request: FriendRequest,
    pub sender: FriendView,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestWithRecipient {
    pub request: FriendRequest,
    pub recipient: FriendView,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FriendRequestsSummary {
    pub incoming: Vec<RequestWithSender>,
    pub accepted_outgoing: Vec<RequestWithRecipient>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationView {
    pub notification: Notification,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub repaired: usize,
}

/// Online/offline event pushed in by the external presence layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user: UserId,
    pub online: bool,
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingFields,
    NotFound,
    Forbidden,
    SelfRequest,
    AlreadyFriends,
    DuplicateRequest,
    Internal,
}

/// Wire shape of every error response. `error` is the machine-readable
/// kind a client branches on; `message` is for humans.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}
