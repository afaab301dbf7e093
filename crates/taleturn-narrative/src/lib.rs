//! Taleturn: turn advancement and session driving.
//!
//! The [`TurnController`](application::controller::TurnController) runs one
//! generation per turn with single-flight execution, progress relay, and
//! cooperative cancellation. The
//! [`SessionDriver`](application::driver::SessionDriver) sits on top of it and
//! turns user intent (start, choose, retry, dismiss) into controller calls.

pub mod application;
pub mod domain;
