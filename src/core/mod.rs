//! Core module - Fundamental traits and types for Reflection
//!
//! This module defines the seams between the conversation logic and its
//! collaborators:
//! - `ChatModel` for the generative-model backend
//! - `HistoryStore` / `SemanticCacheStore` for the document store
//! - Persisted record shapes (`Turn`, `CacheEntry`)

pub mod provider;
pub mod storage;
pub mod types;

pub use provider::ChatModel;
pub use storage::{HistoryStore, SemanticCacheStore};
pub use types::*;
