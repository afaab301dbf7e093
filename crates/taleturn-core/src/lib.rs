//! Taleturn Core: shared session abstractions.
//!
//! This crate defines the types and traits the turn controller, generation
//! backends, and outer surfaces all depend on. It contains no infrastructure
//! code.

pub mod action;
pub mod backend;
pub mod clock;
pub mod error;
pub mod event;
pub mod log;
pub mod progress;
