//! Infrastructure layer providing external service integrations.
//!
//! The HTTP client for the backend, configuration loading, the side store
//! for remembered selections, and CSV export.

pub mod api;
pub mod config;
pub mod export;
pub mod side_store;

pub use api::*;
pub use self::config::*;
pub use export::*;
pub use side_store::*;
