use chrono::Utc;

use lingo_common::{
    FriendRequest, FriendRequestsSummary, RequestId, RequestStatus, RequestWithRecipient,
    RequestWithSender, UserId,
};

use crate::error::{ApiError, Result};
use crate::store::State;

/// Creates a pending request from `actor` to `target`.
///
/// Checks run in a fixed order, all before any write: self-request,
/// target existence, already-friends, then the pair claim. The claim
/// (a compare-and-swap on a direction-independent key) is the
/// uniqueness point, so two opposing sends can never both create a
/// document.
pub fn send(state: &State, actor: &UserId, target: &UserId) -> Result<FriendRequest> {
    if actor == target {
        return Err(ApiError::SelfRequest);
    }
    let recipient = state.users.find_by_id(target)?.ok_or(ApiError::NotFound)?;
    if recipient.friends.contains(actor) {
        return Err(ApiError::AlreadyFriends);
    }

    let request = FriendRequest {
        id: RequestId::generate(),
        sender: actor.clone(),
        recipient: target.clone(),
        status: RequestStatus::Pending,
        created_at: Utc::now(),
    };
    if !state.requests.claim_pair(actor, target, &request.id)? {
        return Err(ApiError::DuplicateRequest);
    }
    state.requests.save(&request)?;
    Ok(request)
}

/// Accepts a request. Only the recipient may accept; the sender gets
/// `Forbidden` like anyone else. Accepting an already-accepted request
/// succeeds and re-runs the friend-set inserts; since those are
/// idempotent, this doubles as the recovery path after a crash between
/// the two single-document writes.
pub fn accept(state: &State, actor: &UserId, request_id: &RequestId) -> Result<FriendRequest> {
    let mut request = state
        .requests
        .find_by_id(request_id)?
        .ok_or(ApiError::NotFound)?;
    if request.recipient != *actor {
        return Err(ApiError::Forbidden);
    }

    if request.status != RequestStatus::Accepted {
        request.status = RequestStatus::Accepted;
        // The status flip lands before either friend-set insert, so an
        // interrupted accept is recovered by re-running the inserts,
        // never by re-deciding acceptance.
        state.requests.save(&request)?;
    }
    state.users.add_friend(&request.sender, &request.recipient)?;
    state.users.add_friend(&request.recipient, &request.sender)?;
    Ok(request)
}

/// Pending requests addressed to `actor`, with the sender's card.
pub fn incoming(state: &State, actor: &UserId) -> Result<Vec<RequestWithSender>> {
    let mut requests = Vec::new();
    for request in state.requests.all()? {
        if request.recipient != *actor || request.status != RequestStatus::Pending {
            continue;
        }
        if let Some(sender) = state.users.find_by_id(&request.sender)? {
            let sender = sender.friend_view(request.sender.clone());
            requests.push(RequestWithSender { request, sender });
        }
    }
    Ok(requests)
}

/// Requests `actor` sent that became friendships. This is a history
/// view, not the live friend list.
pub fn outgoing_accepted(state: &State, actor: &UserId) -> Result<Vec<RequestWithRecipient>> {
    outgoing(state, actor, RequestStatus::Accepted)
}

/// Requests `actor` sent that are still unanswered.
pub fn outgoing_pending(state: &State, actor: &UserId) -> Result<Vec<RequestWithRecipient>> {
    outgoing(state, actor, RequestStatus::Pending)
}

fn outgoing(state: &State, actor: &UserId, status: RequestStatus) -> Result<Vec<RequestWithRecipient>> {
    let mut requests = Vec::new();
    for request in state.requests.all()? {
        if request.sender != *actor || request.status != status {
            continue;
        }
        if let Some(recipient) = state.users.find_by_id(&request.recipient)? {
            let recipient = recipient.friend_view(request.recipient.clone());
            requests.push(RequestWithRecipient { request, recipient });
        }
    }
    Ok(requests)
}

pub fn summary(state: &State, actor: &UserId) -> Result<FriendRequestsSummary> {
    Ok(FriendRequestsSummary {
        incoming: incoming(state, actor)?,
        accepted_outgoing: outgoing_accepted(state, actor)?,
    })
}

/// Repair pass over the two-sided friend lists. The accepted request
/// documents are the authoritative record of who accepted whom; this
/// re-runs the idempotent inserts for every accepted pair and counts
/// how many sides were actually missing. Heals the one-sided state an
/// interrupted accept can leave behind.
pub fn reconcile(state: &State) -> Result<usize> {
    let mut repaired = 0;
    for request in state.requests.all()? {
        if request.status != RequestStatus::Accepted {
            continue;
        }
        let sides = [
            (&request.sender, &request.recipient),
            (&request.recipient, &request.sender),
        ];
        for (owner, friend) in sides {
            let missing = state
                .users
                .find_by_id(owner)?
                .map_or(false, |user| !user.friends.contains(friend));
            if missing && state.users.add_friend(owner, friend)? {
                repaired += 1;
            }
        }
    }
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[test]
    fn send_to_self_is_rejected_without_a_document() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);

        let error = send(&state, &ana, &ana).unwrap_err();
        assert!(matches!(error, ApiError::SelfRequest));
        assert!(state.requests.all().unwrap().is_empty());
    }

    #[test]
    fn send_to_unknown_user_is_not_found() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ghost = UserId::generate();

        let error = send(&state, &ana, &ghost).unwrap_err();
        assert!(matches!(error, ApiError::NotFound));
    }

    #[test]
    fn at_most_one_request_per_pair_in_either_direction() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);

        send(&state, &ana, &ben).unwrap();

        let error = send(&state, &ben, &ana).unwrap_err();
        assert!(matches!(error, ApiError::DuplicateRequest));
        let error = send(&state, &ana, &ben).unwrap_err();
        assert!(matches!(error, ApiError::DuplicateRequest));
        assert_eq!(state.requests.all().unwrap().len(), 1);
    }

    #[test]
    fn send_to_an_existing_friend_is_rejected() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let request = send(&state, &ana, &ben).unwrap();
        accept(&state, &ben, &request.id).unwrap();

        let error = send(&state, &ana, &ben).unwrap_err();
        assert!(matches!(error, ApiError::AlreadyFriends));
    }

    #[test]
    fn only_the_recipient_may_accept() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let cho = testing::seed_user(&state, "Cho", true);
        let request = send(&state, &ana, &ben).unwrap();

        // the sender is just as forbidden as a stranger
        for actor in [&ana, &cho] {
            let error = accept(&state, actor, &request.id).unwrap_err();
            assert!(matches!(error, ApiError::Forbidden));
        }

        // no mutation happened on the way
        let stored = state.requests.find_by_id(&request.id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        assert!(state.users.find_by_id(&ana).unwrap().unwrap().friends.is_empty());
        assert!(state.users.find_by_id(&ben).unwrap().unwrap().friends.is_empty());
    }

    #[test]
    fn accept_links_both_sides_symmetrically() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let request = send(&state, &ana, &ben).unwrap();

        accept(&state, &ben, &request.id).unwrap();

        let ana_doc = state.users.find_by_id(&ana).unwrap().unwrap();
        let ben_doc = state.users.find_by_id(&ben).unwrap().unwrap();
        assert!(ana_doc.friends.contains(&ben));
        assert!(ben_doc.friends.contains(&ana));
    }

    #[test]
    fn accepting_twice_is_a_harmless_no_op() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let request = send(&state, &ana, &ben).unwrap();

        accept(&state, &ben, &request.id).unwrap();
        accept(&state, &ben, &request.id).unwrap();

        let ana_doc = state.users.find_by_id(&ana).unwrap().unwrap();
        let ben_doc = state.users.find_by_id(&ben).unwrap().unwrap();
        assert_eq!(ana_doc.friends.len(), 1);
        assert_eq!(ben_doc.friends.len(), 1);
    }

    #[test]
    fn accept_of_unknown_request_is_not_found() {
        let state = testing::state();
        let ben = testing::seed_user(&state, "Ben", true);

        let error = accept(&state, &ben, &RequestId::generate()).unwrap_err();
        assert!(matches!(error, ApiError::NotFound));
    }

    #[test]
    fn query_views_split_by_role_and_status() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let cho = testing::seed_user(&state, "Cho", true);
        let to_ben = send(&state, &ana, &ben).unwrap();
        send(&state, &ana, &cho).unwrap();

        let ben_summary = summary(&state, &ben).unwrap();
        assert_eq!(ben_summary.incoming.len(), 1);
        assert_eq!(ben_summary.incoming[0].sender.full_name, "Ana");
        assert!(ben_summary.accepted_outgoing.is_empty());

        assert_eq!(outgoing_pending(&state, &ana).unwrap().len(), 2);

        accept(&state, &ben, &to_ben.id).unwrap();

        assert!(summary(&state, &ben).unwrap().incoming.is_empty());
        let accepted = outgoing_accepted(&state, &ana).unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].recipient.full_name, "Ben");
        assert_eq!(outgoing_pending(&state, &ana).unwrap().len(), 1);
    }

    #[test]
    fn reconcile_heals_a_one_sided_friendship() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let request = send(&state, &ana, &ben).unwrap();
        accept(&state, &ben, &request.id).unwrap();

        // simulate a crash that lost one of the two inserts
        let mut ana_doc = state.users.find_by_id(&ana).unwrap().unwrap();
        ana_doc.friends.remove(&ben);
        state.users.save(&ana, &ana_doc).unwrap();

        assert_eq!(reconcile(&state).unwrap(), 1);

        let ana_doc = state.users.find_by_id(&ana).unwrap().unwrap();
        assert!(ana_doc.friends.contains(&ben));

        // a healthy store has nothing to repair
        assert_eq!(reconcile(&state).unwrap(), 0);
    }
}
