//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Actor extraction — identifies the staff member, 401 otherwise
//! 2. Access logger — logs after auth, has the actor

pub mod audit;
pub mod auth;
