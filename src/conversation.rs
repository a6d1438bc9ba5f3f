use crate::entity::EntityRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted conversation linking two participants to one marketplace
/// entity. The participant pair is semantically unordered: {a, b} and {b, a}
/// name the same conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participant_a: String,
    pub participant_b: String,
    pub entity: EntityRef,
    pub created_at: DateTime<Utc>,
    /// Bumped by the messaging side on every send; this crate only writes the
    /// initial value.
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        participant_a: impl Into<String>,
        participant_b: impl Into<String>,
        entity: EntityRef,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            participant_a: participant_a.into(),
            participant_b: participant_b.into(),
            entity,
            created_at: now,
            last_message_at: now,
        }
    }

    /// Whether the unordered pair {a, b} matches this conversation's
    /// participants, regardless of stored order.
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.participant_a == a && self.participant_b == b)
            || (self.participant_a == b && self.participant_b == a)
    }
}
