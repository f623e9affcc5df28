//! Domain layer for encounter quests.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod record;
