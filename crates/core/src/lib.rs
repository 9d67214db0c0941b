//! Core business logic for rawmate.

pub mod services;

pub use services::*;
