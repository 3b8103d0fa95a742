//! OpenAI-compatible chat completions engine

pub mod engine;

pub use engine::{OpenAiReasoningEngine, OpenAiSettings};
