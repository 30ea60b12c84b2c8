//! Command implementations

pub mod dump;
pub mod generate;

pub use dump::dump;
pub use generate::{generate, GenerateOptions};
