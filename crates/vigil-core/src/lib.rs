//! Core types, configuration, and error handling for the Vigil bot.
//!
//! This crate provides the shared foundation used by the other Vigil crates:
//! - [`VigilError`] — unified error type using `thiserror`
//! - [`VigilConfig`] — configuration loaded from `.vigil.toml`
//! - Shared types: [`DiffFile`], [`ReviewComment`], [`ResolvedComment`],
//!   [`PullRequestEvent`], [`ReviewSession`]

mod config;
mod error;
mod types;

pub use config::{GithubConfig, LlmConfig, ReviewConfig, ServerConfig, VigilConfig};
pub use error::VigilError;
pub use types::{
    CommitRef, DiffFile, OwnerInfo, PullRequestEvent, PullRequestInfo, RepositoryInfo,
    ResolvedComment, ReviewComment, ReviewResponse, ReviewSession,
};

/// A convenience `Result` type for Vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
