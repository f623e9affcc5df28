//! Encounter Core: shared domain abstractions.
//!
//! This crate defines the identifiers, geometry, collaborator traits and
//! configuration that every other encounter crate depends on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod config;
pub mod encounter;
pub mod error;
pub mod event;
pub mod geometry;
pub mod ids;
pub mod notify;
pub mod reward;
pub mod rng;
pub mod store;
pub mod world;
