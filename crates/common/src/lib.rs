//! Common utilities and shared types for rawmate.
//!
//! This crate provides foundational components used across all rawmate crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Keyed locks**: Per-key async mutual exclusion via [`KeyedLocks`]
//!
//! # Example
//!
//! ```no_run
//! use rawmate_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod locks;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use locks::KeyedLocks;
