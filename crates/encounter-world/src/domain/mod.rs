//! Pure world-facing domain logic.

pub mod navigation;
pub mod ownership;
pub mod zone;
