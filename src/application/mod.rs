//! Application layer: the two session objects and what they share.
//!
//! Each front end owns one session. A session holds the last snapshot the
//! backend confirmed and runs every user action through the in-flight
//! tracker, refetching after each successful mutation.

pub mod admin;
pub mod in_flight;
pub mod portal;
pub mod state;

#[cfg(test)]
pub(crate) mod fake;

pub use admin::*;
pub use in_flight::*;
pub use portal::*;
pub use state::*;
