//! API middleware stack.
//!
//! Staff routes, outermost → innermost:
//! 1. Rate limiter
//! 2. Auth validator (bearer session lookup)
//! 3. Audit logger (after auth, so it has the user id)
//!
//! Public invitation routes only get the per-token invite limiter.

pub mod audit;
pub mod auth;
pub mod rate;
