//! Floor-plan KPI analyzer backed by an OpenAI-compatible LLM gateway
//!
//! Sends an uploaded floor-plan image together with a KPI description to a
//! LiteLLM-style gateway and returns the model's textual analysis, either as a
//! single completion or as an incrementally parsed event stream.

pub mod app;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
