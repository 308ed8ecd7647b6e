//! Completion API wire types
//!
//! Structs that mirror the provider's `generateContent` JSON format.

use serde::{Deserialize, Serialize};

/// Top-level completion response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    /// Candidate replies from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g., if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate reply
#[derive(Deserialize, Debug)]
pub struct Candidate {
    /// The content of this candidate
    pub content: Content,
}

/// Content of a candidate
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Content parts (typically one text part)
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part of content
#[derive(Deserialize, Debug)]
pub struct Part {
    /// Text of this part
    #[serde(default)]
    pub text: String,
}

/// Feedback about the prompt
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Single-turn completion request
#[derive(Serialize, Debug)]
pub struct CompletionRequest {
    /// Conversation turns; always exactly one user turn
    pub contents: Vec<RequestContent>,
}

/// One turn of a request
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// Speaker of this turn
    pub role: &'static str,
    /// Parts of this turn
    pub parts: Vec<RequestPart>,
}

/// A text part of a request turn
#[derive(Serialize, Debug)]
pub struct RequestPart {
    /// The text content
    pub text: String,
}

impl CompletionRequest {
    /// Build a request holding a single user message
    pub fn single_turn(message: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: message.to_string(),
                }],
            }],
        }
    }
}

impl CompletionResponse {
    /// Text of the first part of the first candidate, if non-empty
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
    }
}
