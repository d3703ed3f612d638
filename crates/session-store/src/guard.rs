//! Access decision for views and commands that need a signed-in user.

use crate::SessionSnapshot;
use api_boundary::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Bootstrap has not settled yet.
    Wait,
    RedirectToLogin,
    Allow(User),
}

pub fn decide_access(snapshot: &SessionSnapshot) -> AccessDecision {
    if snapshot.is_loading {
        return AccessDecision::Wait;
    }

    match &snapshot.user {
        Some(user) => AccessDecision::Allow(user.clone()),
        None => AccessDecision::RedirectToLogin,
    }
}
