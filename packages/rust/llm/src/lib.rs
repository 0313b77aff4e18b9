//! Text-generation backend seam and its OpenAI-compatible HTTP client.
//!
//! The pipeline only ever sees [`GenerationBackend`]: a role-tagged message
//! sequence goes in, one text payload plus a token count comes out. The
//! payload may legitimately be empty or very short; validating it is the
//! caller's job.

mod openai;

use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use recap_shared::{RecapError, Result};

pub use openai::{OpenAiClient, OpenAiOptions};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Reasoning effort hint for reasoning-capable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl FromStr for ReasoningEffort {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(RecapError::config(format!(
                "invalid reasoning effort '{other}': expected low, medium, or high"
            ))),
        }
    }
}

/// A chat completion request, serialized as the request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// The text payload and usage of one completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Generated text; may be empty.
    pub text: String,
    /// Total tokens billed for the call.
    pub tokens_used: u64,
    /// Model that served the request.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// An opaque text-generation backend.
///
/// Implementations return `Err` only for transport or protocol failures.
/// Empty or malformed text is a successful call.
pub trait GenerationBackend: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> impl Future<Output = Result<ChatResponse>> + Send;
}
