use std::collections::BTreeSet;

use chrono::Utc;

use lingo_common::{Notification, NotificationId, NotificationView, UserId};

use crate::error::Result;
use crate::store::State;

/// Builds one notification per current friend for a display-name change
/// and inserts them as a single batch, so a partial store failure
/// surfaces as one aggregate error. Callers treat delivery as
/// best-effort, not transactional.
pub fn fanout_name_change(
    state: &State,
    user: &UserId,
    old_name: &str,
    new_name: &str,
    friends: &BTreeSet<UserId>,
) -> Result<usize> {
    let created_at = Utc::now();
    let notifications: Vec<Notification> = friends
        .iter()
        .map(|friend| Notification {
            id: NotificationId::generate(),
            sender: user.clone(),
            recipient: friend.clone(),
            message: format!("{old_name} has changed their name to {new_name}"),
            created_at,
        })
        .collect();
    state.notifications.insert_many(&notifications)?;
    Ok(notifications.len())
}

/// Newest first, each annotated with the sender's current name and
/// avatar for rendering.
pub fn list_for_recipient(state: &State, actor: &UserId) -> Result<Vec<NotificationView>> {
    let mut views = Vec::new();
    for notification in state.notifications.for_recipient(actor)? {
        let (sender_name, sender_avatar) = match state.users.find_by_id(&notification.sender)? {
            Some(sender) => (sender.full_name, sender.avatar),
            None => (String::new(), None),
        };
        views.push(NotificationView {
            notification,
            sender_name,
            sender_avatar,
        });
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use lingo_common::{Notification, NotificationId};

    use super::*;
    use crate::store::testing;

    #[test]
    fn fanout_covers_each_friend_exactly_once() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let cho = testing::seed_user(&state, "Cho", true);
        let friends: BTreeSet<_> = [ben.clone(), cho.clone()].into();

        let count = fanout_name_change(&state, &ana, "Ana", "Anya", &friends).unwrap();
        assert_eq!(count, 2);

        for friend in [&ben, &cho] {
            let inbox = list_for_recipient(&state, friend).unwrap();
            assert_eq!(inbox.len(), 1);
            assert_eq!(
                inbox[0].notification.message,
                "Ana has changed their name to Anya"
            );
        }
        assert!(list_for_recipient(&state, &ana).unwrap().is_empty());
    }

    #[test]
    fn empty_friend_set_writes_nothing() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);

        let count = fanout_name_change(&state, &ana, "Ana", "Anya", &BTreeSet::new()).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn inbox_is_ordered_newest_first() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);

        let now = Utc::now();
        let batch: Vec<Notification> = (0..3)
            .map(|age| Notification {
                id: NotificationId::generate(),
                sender: ana.clone(),
                recipient: ben.clone(),
                message: format!("message {age}"),
                created_at: now - Duration::minutes(age),
            })
            .collect();
        state.notifications.insert_many(&batch).unwrap();

        let inbox = list_for_recipient(&state, &ben).unwrap();
        let messages: Vec<_> = inbox
            .iter()
            .map(|view| view.notification.message.as_str())
            .collect();
        assert_eq!(messages, vec!["message 0", "message 1", "message 2"]);
    }

    #[test]
    fn views_carry_the_senders_current_name_and_avatar() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let friends: BTreeSet<_> = [ben.clone()].into();
        fanout_name_change(&state, &ana, "Ana", "Anya", &friends).unwrap();

        let mut ana_doc = state.users.find_by_id(&ana).unwrap().unwrap();
        ana_doc.full_name = String::from("Anya");
        ana_doc.avatar = Some(String::from("https://cdn.example/anya.png"));
        state.users.save(&ana, &ana_doc).unwrap();

        let inbox = list_for_recipient(&state, &ben).unwrap();
        assert_eq!(inbox[0].sender_name, "Anya");
        assert_eq!(
            inbox[0].sender_avatar.as_deref(),
            Some("https://cdn.example/anya.png")
        );
    }
}
