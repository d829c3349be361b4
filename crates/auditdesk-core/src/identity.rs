use serde::{Deserialize, Serialize};

/// The acting user, supplied by the identity provider.
///
/// Only the opaque user id is used, for attribution (`last_modified_by`,
/// `uploaded_by`, `auditor_id`). No auth logic lives here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.user_id
    }
}
