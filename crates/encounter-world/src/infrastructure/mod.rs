//! Concrete `WorldSurface` implementations.

pub mod grid_world;
