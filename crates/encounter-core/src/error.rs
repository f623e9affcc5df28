//! Domain error types.

use thiserror::Error;

use crate::ids::{PlayerId, QuestId};

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The player holds no active encounter.
    #[error("player {0} has no active encounter")]
    NoActiveEncounter(PlayerId),

    /// No encounter instance with this id could be resolved.
    #[error("encounter not found: {0}")]
    EncounterNotFound(QuestId),

    /// The requested transition is not allowed from the current state.
    #[error("cannot {action} encounter {quest_id} while {state}")]
    InvalidTransition {
        /// The encounter that rejected the transition.
        quest_id: QuestId,
        /// The state it was in.
        state: String,
        /// The attempted action.
        action: &'static str,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
