pub mod models;
pub mod lifecycle;
pub mod validation;
pub mod errors;

pub use models::*;
pub use lifecycle::*;
pub use validation::*;
pub use errors::*;
