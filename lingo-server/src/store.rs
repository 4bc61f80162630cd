use anyhow::{Context, Result};
use sled::{Batch, Db, Tree};

use lingo_common::non_api_structs::UserData;
use lingo_common::{FriendRequest, Notification, RequestId, UserId};

use crate::presence::Presence;

/// Shared handle cloned into every request handler. Each field wraps
/// one sled tree; every operation below is atomic per document, and
/// nothing in the service spans documents transactionally.
#[derive(Clone)]
pub struct State {
    pub users: ProfileStore,
    pub requests: RequestStore,
    pub notifications: NotificationStore,
    pub presence: Presence,
}

impl State {
    pub fn open(path: impl AsRef<std::path::Path>, presence: Presence) -> Result<Self> {
        let db = sled::open(path).context("Error opening database")?;
        Self::from_db(&db, presence)
    }

    fn from_db(db: &Db, presence: Presence) -> Result<Self> {
        Ok(Self {
            users: ProfileStore::new(db)?,
            requests: RequestStore::new(db)?,
            notifications: NotificationStore::new(db)?,
            presence,
        })
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    tree: Tree,
}

impl ProfileStore {
    fn new(db: &Db) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree("users")?,
        })
    }

    pub fn find_by_id(&self, id: &UserId) -> Result<Option<UserData>> {
        match self.tree.get(id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, id: &UserId, user: &UserData) -> Result<()> {
        self.tree.insert(id.0.as_bytes(), serde_json::to_vec(user)?)?;
        Ok(())
    }

    /// Idempotent set-insert of `friend` into `id`'s friend set, atomic
    /// over the one user document. Returns false when `id` does not
    /// resolve. Repeating the call cannot change the result.
    pub fn add_friend(&self, id: &UserId, friend: &UserId) -> Result<bool> {
        let friend = friend.clone();
        let updated = self.tree.update_and_fetch(id.0.as_bytes(), move |old| {
            let bytes = old?;
            match serde_json::from_slice::<UserData>(bytes) {
                Ok(mut user) => {
                    user.friends.insert(friend.clone());
                    serde_json::to_vec(&user).ok().or_else(|| Some(bytes.to_vec()))
                }
                // an unreadable document is left as it was
                Err(_) => Some(bytes.to_vec()),
            }
        })?;
        Ok(updated.is_some())
    }

    pub fn all(&self) -> Result<Vec<(UserId, UserData)>> {
        let mut users = Vec::new();
        for entry in self.tree.iter() {
            let (key, value) = entry?;
            let id = UserId(String::from_utf8(key.to_vec())?);
            users.push((id, serde_json::from_slice(&value)?));
        }
        Ok(users)
    }
}

#[derive(Clone)]
pub struct RequestStore {
    tree: Tree,
    pairs: Tree,
}

impl RequestStore {
    fn new(db: &Db) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree("friend_requests")?,
            pairs: db.open_tree("request_pairs")?,
        })
    }

    /// Claims the unordered pair for a new request. The key is
    /// direction-independent and the claim is a compare-and-swap, so
    /// two opposing sends cannot both create a document; the loser sees
    /// `false`.
    pub fn claim_pair(&self, a: &UserId, b: &UserId, id: &RequestId) -> Result<bool> {
        let claimed =
            self.pairs
                .compare_and_swap(pair_key(a, b), None as Option<&[u8]>, Some(id.0.as_bytes()))?;
        Ok(claimed.is_ok())
    }

    pub fn find_by_id(&self, id: &RequestId) -> Result<Option<FriendRequest>> {
        match self.tree.get(id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, request: &FriendRequest) -> Result<()> {
        self.tree
            .insert(request.id.0.as_bytes(), serde_json::to_vec(request)?)?;
        Ok(())
    }

    pub fn all(&self) -> Result<Vec<FriendRequest>> {
        let mut requests = Vec::new();
        for entry in self.tree.iter() {
            let (_, value) = entry?;
            requests.push(serde_json::from_slice(&value)?);
        }
        Ok(requests)
    }
}

/// Direction-independent key for a user pair: both ids, sorted.
fn pair_key(a: &UserId, b: &UserId) -> Vec<u8> {
    let (low, high) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let mut key = Vec::with_capacity(low.0.len() + high.0.len() + 1);
    key.extend_from_slice(low.0.as_bytes());
    key.push(b'|');
    key.extend_from_slice(high.0.as_bytes());
    key
}

#[derive(Clone)]
pub struct NotificationStore {
    tree: Tree,
}

impl NotificationStore {
    fn new(db: &Db) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree("notifications")?,
        })
    }

    /// Inserts a whole fanout as one batch. A failure here is reported
    /// as a single aggregate error, never retried per item.
    pub fn insert_many(&self, notifications: &[Notification]) -> Result<()> {
        let mut batch = Batch::default();
        for notification in notifications {
            batch.insert(recipient_key(notification), serde_json::to_vec(notification)?);
        }
        self.tree
            .apply_batch(batch)
            .context("Error inserting notification batch")?;
        Ok(())
    }

    /// Newest first. Keys embed an inverted timestamp, so the natural
    /// prefix-scan order is already descending by creation time.
    pub fn for_recipient(&self, user: &UserId) -> Result<Vec<Notification>> {
        let prefix = format!("{}|", user.0);
        let mut notifications = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            notifications.push(serde_json::from_slice(&value)?);
        }
        Ok(notifications)
    }
}

fn recipient_key(notification: &Notification) -> Vec<u8> {
    let inverted = u64::MAX - notification.created_at.timestamp_millis() as u64;
    format!(
        "{}|{:020}|{}",
        notification.recipient.0, inverted, notification.id.0
    )
    .into_bytes()
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use lingo_common::non_api_structs::UserData;
    use lingo_common::UserId;

    use super::State;
    use crate::presence::Presence;

    pub fn state() -> State {
        let db = sled::Config::new().temporary(true).open().unwrap();
        State::from_db(&db, Presence::disabled()).unwrap()
    }

    pub fn seed_user(state: &State, name: &str, onboarded: bool) -> UserId {
        let id = UserId::generate();
        let user = UserData {
            full_name: name.to_string(),
            bio: format!("{name} likes language exchange"),
            native_language: String::from("en"),
            learning_language: String::from("es"),
            location: String::from("Lisbon"),
            avatar: None,
            onboarded,
            friends: Default::default(),
            created_at: Utc::now(),
        };
        state.users.save(&id, &user).unwrap();
        id
    }
}
