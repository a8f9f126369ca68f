//! Shared UI components.

pub mod error;

pub use error::show_startup_error;
