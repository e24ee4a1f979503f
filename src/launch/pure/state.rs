//! Launch state machine transitions

use crate::launch::types::LaunchState;

impl LaunchState {
    /// The only state reachable from `self` on success
    pub fn successor(self) -> Option<LaunchState> {
        match self {
            LaunchState::Uninitialized => Some(LaunchState::RuntimeReady),
            LaunchState::RuntimeReady => Some(LaunchState::ServiceReady),
            LaunchState::ServiceReady => Some(LaunchState::RegistryReady),
            LaunchState::RegistryReady => Some(LaunchState::Authenticated),
            LaunchState::Authenticated => Some(LaunchState::SessionBound),
            LaunchState::SessionBound => Some(LaunchState::Streaming),
            LaunchState::Streaming => Some(LaunchState::Launched),
            LaunchState::Launched => Some(LaunchState::Polling),
            LaunchState::Polling | LaunchState::Failed => None,
        }
    }
}

/// Forward by exactly one step, or into `Failed` from anywhere but `Failed`
pub fn is_valid_transition(from: LaunchState, to: LaunchState) -> bool {
    if to == LaunchState::Failed {
        return from != LaunchState::Failed;
    }
    from.successor() == Some(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [LaunchState; 9] = [
        LaunchState::Uninitialized,
        LaunchState::RuntimeReady,
        LaunchState::ServiceReady,
        LaunchState::RegistryReady,
        LaunchState::Authenticated,
        LaunchState::SessionBound,
        LaunchState::Streaming,
        LaunchState::Launched,
        LaunchState::Polling,
    ];

    #[test]
    fn each_state_advances_to_the_next() {
        for pair in ORDER.windows(2) {
            assert!(is_valid_transition(pair[0], pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(!is_valid_transition(
            LaunchState::RuntimeReady,
            LaunchState::Authenticated
        ));
        assert!(!is_valid_transition(
            LaunchState::Launched,
            LaunchState::Streaming
        ));
        assert!(!is_valid_transition(
            LaunchState::Polling,
            LaunchState::Uninitialized
        ));
    }

    #[test]
    fn every_live_state_can_fail() {
        for state in ORDER {
            assert!(is_valid_transition(state, LaunchState::Failed));
        }
    }

    #[test]
    fn failed_is_absorbing() {
        for state in ORDER {
            assert!(!is_valid_transition(LaunchState::Failed, state));
        }
        assert!(!is_valid_transition(LaunchState::Failed, LaunchState::Failed));
    }
}
