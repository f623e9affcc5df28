//! Commands accepted by the encounter runtime.

use uuid::Uuid;

use crate::ids::PlayerId;

/// A request to change encounter state.
///
/// Every event a command produces carries its correlation id.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used in logs, e.g. `encounter.accept`.
    fn command_type(&self) -> &'static str;

    /// Correlation id shared with the events the command produces.
    fn correlation_id(&self) -> Uuid;

    /// The player whose document the command changes. World events such as
    /// object deaths name no player; the owner is resolved from the object.
    fn target_player(&self) -> Option<PlayerId> {
        None
    }
}
