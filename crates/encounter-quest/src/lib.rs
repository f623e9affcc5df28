//! Encounter quest lifecycle.
//!
//! Responsible for the encounter instance state machine (accept, trigger,
//! progress, turn-in, abandon, disconnect and reconnect), the periodic
//! proximity scan that drives spawning, kill attribution, the startup orphan
//! sweep and the administrative surface.

pub mod application;
pub mod domain;
