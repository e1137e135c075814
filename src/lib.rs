//! # Reflection
//!
//! Chat assistant glue between a Gemini model and a document store.
//!
//! ## Features
//!
//! - **Gemini client:** one `generateContent` round-trip per message with
//!   configurable safety thresholds
//! - **Persistent history:** every exchange is stored as a human turn and
//!   an ai turn keyed by session, and replayed on the next message
//! - **Semantic cache log:** optionally records the request embedding with
//!   the generated response (write-only)
//! - **Storage:** PostgreSQL (JSONB + pgvector) or in-memory

pub mod agent;
pub mod config;
pub mod core;
pub mod database;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
