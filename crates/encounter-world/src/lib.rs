//! Encounter runtime: world-facing context.
//!
//! Responsible for choosing where encounters happen, marking and tracking the
//! objects created for them, deriving navigation cues, and materialising or
//! removing creature groups.

pub mod application;
pub mod domain;
pub mod infrastructure;
