//! Dream journal with AI-written interpretations
//!
//! Records dreams with moods and tags, sends the dream text to an
//! OpenAI-compatible chat-completion API, and decodes the reply into a
//! structured interpretation stored alongside the dream.

pub mod ai;
pub mod app;
pub mod entitlement;
pub mod error;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod state;
pub mod store;

pub use error::{Error, NetworkCategory, Result};
