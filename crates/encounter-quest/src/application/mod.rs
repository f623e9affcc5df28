//! Application layer for encounter quests.

pub mod admin;
pub mod command_handlers;
pub mod context;
pub mod proximity;
pub mod query_handlers;
pub mod reaper;
pub mod sessions;
pub mod work_gate;

#[cfg(test)]
pub(crate) mod fixtures;
