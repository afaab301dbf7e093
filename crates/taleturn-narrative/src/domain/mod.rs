//! Domain types for turn advancement.

pub mod commands;
pub mod state;
