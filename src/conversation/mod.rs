//! Conversation history management.
//!
//! This module provides in-memory storage for optimization conversations.
//! Each conversation starts from a few-shot seed so the model sees the
//! expected answer shape before the first real prompt.
//!
//! # Architecture
//!
//! - [`Conversation`]: history of a single chat
//! - [`ConversationStore`]: thread-safe store, including the default
//!   conversation used by clients that send no session ID
//!
//! # Example
//!
//! ```rust
//! use prompt_optimizer::conversation::ConversationStore;
//!
//! let store = ConversationStore::new();
//! let conversation = store.create();
//! conversation.add_user_message("Hello!");
//!
//! assert_eq!(conversation.message_count(), 1);
//! ```

pub mod prompts;
mod thread;

pub use thread::{
    Conversation, ConversationStore, DEFAULT_CONVERSATION_ID, DEFAULT_IDLE_TIMEOUT, format_prompt,
};
