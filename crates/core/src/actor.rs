//! Actor identity passed explicitly into every core operation.
//!
//! There is no ambient "current user" state anywhere in the core; request
//! handlers resolve identity once at the boundary and thread it through.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who is performing an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Actor {
    /// An authenticated user with a durable identity.
    User { id: UserId },
    /// An anonymous caller. Orders placed by guests are not persisted.
    Guest,
}

impl Actor {
    pub fn user(id: UserId) -> Self {
        Self::User { id }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User { id } => Some(*id),
            Self::Guest => None,
        }
    }
}
