use serde::{Deserialize, Serialize};

/// OpenAI Chat Completions request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-3.5-turbo")
    pub model: String,

    /// Conversation turns; the relay always sends exactly one user turn
    pub messages: Vec<ChatMessage>,

    /// Enable incremental (chunked) output
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    /// "user", "assistant" or "system"
    pub role: String,

    pub content: String,
}

impl ChatRequest {
    /// Build a streaming request carrying a single user turn with the
    /// prompt text, verbatim.
    pub fn user_turn(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: true,
        }
    }
}

/// One streamed completion chunk, as carried in an SSE `data:` line
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDelta {
    /// Incremental piece of generated text; absent on role/finish chunks
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatChunk {
    /// Text delta carried by this chunk, if any
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }
}

/// Error envelope some upstreams emit as a stream chunk instead of a delta
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorEnvelope {
    pub error: UpstreamErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorBody {
    pub message: String,

    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}
