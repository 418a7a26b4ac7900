//! Client for the remote completion API.
//!
//! [`ZaiClient`] speaks the Anthropic Messages wire format that Z.ai exposes
//! for its GLM models and implements [`glm_core::CompletionBackend`].

mod client;
mod wire;

pub use client::{ZaiClient, ANTHROPIC_VERSION, DEFAULT_TIMEOUT, MESSAGES_PATH};
