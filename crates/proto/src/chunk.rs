use serde::{Deserialize, Serialize};

use crate::{ChoiceLogprobs, Usage};

/// A partial function call in a streamed tool call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionCallDelta {
    /// Set on the first fragment only.
    pub name: Option<String>,
    /// Next fragment of the JSON arguments.
    pub arguments: Option<String>,
}

/// A fragment of a tool call; fragments with the same `index` belong to
/// the same call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallDelta {
    /// Position of the call in the message.
    pub index: Option<u32>,
    /// Call id, set on the first fragment only.
    pub id: Option<String>,
    /// Always `function` when present.
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    /// The function fragment.
    pub function: Option<FunctionCallDelta>,
}

/// The incremental message of a streamed chat choice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Delta {
    /// Set on the first chunk only.
    pub role: Option<String>,
    /// Next fragment of the content.
    pub content: Option<String>,
    /// Next fragment of the reasoning text.
    pub reasoning_content: Option<String>,
    /// Fragments of tool calls.
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// One choice inside a streamed chunk.
///
/// Chat chunks fill `delta`, text completion chunks fill `text`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkChoice {
    /// Position among the choices.
    pub index: u32,
    /// Incremental chat message.
    pub delta: Option<Delta>,
    /// Incremental completion text.
    pub text: Option<String>,
    /// Set on the last chunk of the choice.
    pub finish_reason: Option<String>,
    /// Log probabilities of the tokens in this chunk.
    pub logprobs: Option<ChoiceLogprobs>,
}

/// A single server-sent event of a streamed completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionChunk {
    /// Completion id, shared by all chunks of one response.
    pub id: String,
    /// `chat.completion.chunk` or `text_completion`.
    pub object: String,
    /// Unix timestamp in seconds.
    pub created: i64,
    /// Model that produced the completion.
    pub model: String,
    /// Backend configuration fingerprint.
    pub system_fingerprint: Option<String>,
    /// Choice fragments; empty in the trailing usage chunk.
    pub choices: Vec<ChunkChoice>,
    /// Only present in the trailing chunk when usage was requested.
    pub usage: Option<Usage>,
}

impl CompletionChunk {
    /// Returns the text carried by the first choice, from either the chat
    /// delta or the completion text.
    pub fn text(&self) -> Option<&str> {
        let choice = self.choices.first()?;
        choice
            .delta
            .as_ref()
            .and_then(|delta| delta.content.as_deref())
            .or(choice.text.as_deref())
    }
}
