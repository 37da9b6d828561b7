pub mod error;
pub mod model;
pub mod utils;

pub use error::SignalError;
pub use model::*;
