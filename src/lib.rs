//! horse-id - terminal front ends for horse identification submissions
//!
//! An applicant portal and an administrator console over the submission
//! backend, with the lifecycle rules that decide what each screen may offer.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
