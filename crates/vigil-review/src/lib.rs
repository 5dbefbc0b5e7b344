//! Review orchestration for the Vigil bot.
//!
//! Provides the review pipeline: diff position resolution, token-budget
//! file filtering, prompt construction and response parsing, GitHub and
//! LLM clients, and the paced session orchestrator.

pub mod budget;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod position;
pub mod prompt;
