//! LLM integration module

pub mod client;
pub mod prompts;
pub mod postprocess;
pub mod analyzer;
