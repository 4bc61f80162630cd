use lingo_common::{UserId, UserView};

use crate::error::{ApiError, Result};
use crate::store::State;

/// Candidate pool for the discover page: every onboarded user except
/// the requester and the requester's current friends. Store-native
/// order, no pagination, no side effects.
pub fn recommend(state: &State, actor: &UserId) -> Result<Vec<UserView>> {
    let requester = state.users.find_by_id(actor)?.ok_or(ApiError::NotFound)?;
    let mut candidates = Vec::new();
    for (id, user) in state.users.all()? {
        if id == *actor || requester.friends.contains(&id) || !user.onboarded {
            continue;
        }
        candidates.push(user.view(id));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[test]
    fn excludes_self_friends_and_not_onboarded() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let cho = testing::seed_user(&state, "Cho", true);
        let dre = testing::seed_user(&state, "Dre", false);
        state.users.add_friend(&ana, &ben).unwrap();
        state.users.add_friend(&ben, &ana).unwrap();

        let pool = recommend(&state, &ana).unwrap();
        let ids: Vec<_> = pool.iter().map(|u| u.id.clone()).collect();

        assert_eq!(ids, vec![cho.clone()]);
        assert!(!ids.contains(&ana));
        assert!(!ids.contains(&ben));
        assert!(!ids.contains(&dre));
        assert!(ids.contains(&cho));
    }

    #[test]
    fn friendless_user_sees_all_onboarded_peers() {
        let state = testing::state();
        let ana = testing::seed_user(&state, "Ana", true);
        let ben = testing::seed_user(&state, "Ben", true);
        let cho = testing::seed_user(&state, "Cho", true);

        let pool = recommend(&state, &ana).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.iter().any(|u| u.id == ben));
        assert!(pool.iter().any(|u| u.id == cho));
    }

    #[test]
    fn unknown_requester_is_not_found() {
        let state = testing::state();
        testing::seed_user(&state, "Ana", true);
        let ghost = lingo_common::UserId::generate();

        let error = recommend(&state, &ghost).unwrap_err();
        assert!(matches!(error, crate::error::ApiError::NotFound));
    }
}
