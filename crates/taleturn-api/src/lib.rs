//! Taleturn API: HTTP surface over a single narrative session.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
