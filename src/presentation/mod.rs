//! Presentation layer: ratatui rendering and key handling for both front ends.
//!
//! Nothing here decides what is permitted. Controls are drawn from the
//! session's guard decisions and every key maps to one session action.

pub mod ui;
pub mod input;

pub use ui::*;
pub use input::*;
