pub mod client;
pub mod interpret;
pub mod types;

pub use client::OpenAiHttpClient;
pub use interpret::{parse_interpretation, OpenAiInterpretationClient};
