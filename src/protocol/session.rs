//! Per-connection session state.
//!
//! A session starts unauthenticated and moves to authenticated at most once.
//! There is no logout; the session is dropped with its connection.

use crate::storage::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    username: String,
    user_id: UserId,
}

#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
    outbound_message_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|i| i.user_id)
    }

    /// Bind the session to a user. Returns `false` if already bound; the
    /// existing identity is never replaced.
    pub fn authenticate(&mut self, username: impl Into<String>, user_id: UserId) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(Identity {
            username: username.into(),
            user_id,
        });
        true
    }

    /// Id for the next outbound frame: 0, 1, 2, ... wrapping at `u32::MAX`.
    pub fn next_message_id(&mut self) -> u32 {
        let id = self.outbound_message_id;
        self.outbound_message_id = self.outbound_message_id.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unauthenticated() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn test_identity_set_once() {
        let mut session = Session::new();
        let alice = UserId::new();
        assert!(session.authenticate("alice", alice));
        assert!(!session.authenticate("mallory", UserId::new()));

        assert_eq!(session.username(), Some("alice"));
        assert_eq!(session.user_id(), Some(alice));
    }

    #[test]
    fn test_message_ids_increase_from_zero() {
        let mut session = Session::new();
        let ids: Vec<u32> = (0..4).map(|_| session.next_message_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_message_id_wraps() {
        let mut session = Session {
            identity: None,
            outbound_message_id: u32::MAX,
        };
        assert_eq!(session.next_message_id(), u32::MAX);
        assert_eq!(session.next_message_id(), 0);
    }
}
