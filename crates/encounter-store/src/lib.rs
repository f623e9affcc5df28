//! Quest document store backed by JSON files.

pub mod file_quest_store;
