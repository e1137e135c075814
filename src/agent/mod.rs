//! Agent module - Gemini client, prompts and conversation management
//!
//! This module handles all model-facing functionality:
//! - Gemini `generateContent` client
//! - The assistant's system instruction
//! - Conversation manager that replays history and records each exchange

mod client;
mod conversation;
pub mod prompts;
pub mod types;

pub use client::GeminiClient;
pub use conversation::{ChatRequest, ConversationManager};
pub use prompts::{resolve_system_prompt, FLOWER_SHOP_PERSONA};
pub use types::*;
