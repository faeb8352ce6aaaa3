//! AI service integration for dream interpretation
//!
//! Sends dream descriptions to an OpenAI-compatible chat-completion API and
//! decodes the structured interpretation it returns.

pub mod mock;
pub mod openai;

pub use mock::MockInterpretationClient;
pub use openai::OpenAiInterpretationClient;

use crate::models::{DreamRequest, Interpretation};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait InterpretationService: Send + Sync {
    /// Interpret a single dream. Blank text fails before any I/O; every
    /// other failure is terminal for the call and is not retried.
    async fn interpret(&self, request: &DreamRequest) -> Result<Interpretation>;
}
