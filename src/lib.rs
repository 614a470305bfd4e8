//! # Prompt Relay
//!
//! A single-endpoint HTTP relay that streams OpenAI chat completions back
//! to the caller as plain text.
//!
//! ## Overview
//!
//! `POST /` accepts a raw text body, forwards it upstream as one user
//! turn with streaming output requested, and writes each generated text
//! delta to the response as it arrives instead of buffering the full
//! completion.
//!
//! The relay handles:
//! - Incremental SSE decoding of the upstream byte stream
//! - Ordered, unbuffered delta forwarding
//! - Upstream error absorption (logged, never surfaced as a status code)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prompt_relay::config::RelayConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Requires OPENAI_API_KEY (or RELAY_CONFIG_FILE) in the environment
//! let config = RelayConfig::load()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and handling
//! - [`models`] - Data structures for the chat-completions wire format
//! - [`provider`] - The streaming provider trait and its event model
//! - [`client`] - OpenAI client implementation
//! - [`streaming`] - Incremental SSE decoder
//! - [`relay`] - The HTTP endpoint and the stream bridge

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod relay;
pub mod streaming;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
