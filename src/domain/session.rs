//! Explicit actor identity passed to every operation that needs one.

use super::UserId;

/// The authenticated user on whose behalf an operation runs.
///
/// Authentication itself happens upstream; by the time a `Session` exists
/// the user ID has been vouched for. Services never read identity from
/// anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
}

impl Session {
    /// Creates a session acting as `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns `true` if the session acts as `user_id`.
    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
