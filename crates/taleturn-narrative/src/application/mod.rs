//! Application services: the turn controller, the session driver, and the
//! read-model queries consumers render from.

pub mod controller;
pub mod driver;
pub mod query_handlers;
