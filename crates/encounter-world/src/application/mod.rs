//! Operations that mutate the world.

pub mod spawner;
