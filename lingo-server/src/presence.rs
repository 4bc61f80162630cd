use lingo_common::{PresenceEvent, UserId};
use serde::Serialize;

/// Boundary to the external real-time layer. The service pushes user
/// and friendship identities out so the provider can wire up channels,
/// and accepts online/offline events in; it never tracks presence
/// itself. Delivery is best-effort: failures are logged and do not
/// surface to the caller.
#[derive(Clone)]
pub struct Presence {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl Presence {
    /// Reads the provider endpoint from `LINGO_PRESENCE_URL`; without
    /// it every push is a no-op.
    pub fn from_env() -> Self {
        Self {
            client: Default::default(),
            endpoint: std::env::var("LINGO_PRESENCE_URL").ok(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            client: Default::default(),
            endpoint: None,
        }
    }

    pub async fn announce_user(&self, user: &UserId, full_name: &str) {
        if let Some(endpoint) = &self.endpoint {
            let payload = UserUpsert {
                user: user.clone(),
                full_name: full_name.to_string(),
            };
            let sent = self
                .client
                .post(endpoint.clone() + "/users")
                .json(&payload)
                .send()
                .await;
            if let Err(error) = sent {
                tracing::warn!("presence user announce failed: {error}");
            }
        }
    }

    pub async fn friendship_established(&self, a: &UserId, b: &UserId) {
        if let Some(endpoint) = &self.endpoint {
            let payload = FriendshipUpsert {
                users: [a.clone(), b.clone()],
            };
            let sent = self
                .client
                .post(endpoint.clone() + "/friendships")
                .json(&payload)
                .send()
                .await;
            if let Err(error) = sent {
                tracing::warn!("presence friendship push failed: {error}");
            }
        }
    }

    /// The provider owns presence state; receipt is only logged here.
    pub fn record_event(&self, event: &PresenceEvent) {
        tracing::info!(user = %event.user.0, online = event.online, "presence event");
    }
}

#[derive(Serialize)]
struct UserUpsert {
    user: UserId,
    full_name: String,
}

#[derive(Serialize)]
struct FriendshipUpsert {
    users: [UserId; 2],
}
