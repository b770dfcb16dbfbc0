use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ClassifyError, ResponseMessage};

/// The structured error object reported by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    /// Human-readable description.
    pub message: String,
    /// Error category, e.g. `invalid_request_error`.
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    /// The offending parameter(s), if reported.
    pub param: Option<Value>,
    /// Machine-readable code; may be a string or a number.
    pub code: Option<Value>,
}

impl Display for ErrorBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ErrorBody {}

/// A body of the shape `{"error": {...}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The reported error.
    pub error: ErrorBody,
}

/// Token accounting of a completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Tokens generated.
    pub completion_tokens: u64,
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Prompt tokens served from the context cache.
    pub prompt_cache_hit_tokens: Option<u64>,
    /// Prompt tokens not found in the context cache.
    pub prompt_cache_miss_tokens: Option<u64>,
    /// Sum of prompt and completion tokens.
    pub total_tokens: u64,
    /// Breakdown of the generated tokens.
    pub completion_tokens_details: Option<CompletionTokensDetails>,
}

/// Breakdown of generated tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionTokensDetails {
    /// Tokens spent on reasoning.
    pub reasoning_tokens: u64,
}

/// A candidate token and its log probability.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopLogprob {
    /// The token text.
    pub token: String,
    /// Its log probability.
    pub logprob: f64,
    /// UTF-8 bytes of the token.
    pub bytes: Option<Vec<u8>>,
}

/// Log probability details of one generated token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLogprob {
    /// The token text.
    pub token: String,
    /// Its log probability.
    pub logprob: f64,
    /// UTF-8 bytes of the token.
    pub bytes: Option<Vec<u8>>,
    /// The most likely alternatives at this position.
    pub top_logprobs: Vec<TopLogprob>,
}

/// Log probabilities attached to a chat choice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceLogprobs {
    /// One entry per generated token.
    pub content: Option<Vec<TokenLogprob>>,
}

/// One generated alternative of a chat completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Position among the choices.
    #[serde(default)]
    pub index: u32,
    /// Why generation stopped, e.g. `stop` or `tool_calls`.
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// The generated message.
    pub message: ResponseMessage,
    /// Present when log probabilities were requested.
    #[serde(default)]
    pub logprobs: Option<ChoiceLogprobs>,
}

/// Success body of the chat completion endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatCompletionResponse {
    /// Completion id.
    pub id: String,
    /// Always `chat.completion`.
    pub object: String,
    /// Unix timestamp in seconds.
    pub created: i64,
    /// Model that produced the completion.
    pub model: String,
    /// Backend configuration fingerprint.
    pub system_fingerprint: Option<String>,
    /// Generated alternatives.
    pub choices: Vec<ChatChoice>,
    /// Token accounting.
    pub usage: Usage,
}

/// Log probabilities attached to a text completion choice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLogprobs {
    /// Generated tokens.
    pub tokens: Vec<String>,
    /// Log probability of each token.
    pub token_logprobs: Vec<f64>,
    /// Alternatives at each position.
    pub top_logprobs: Vec<BTreeMap<String, f64>>,
    /// Character offset of each token in the text.
    pub text_offset: Vec<u64>,
}

/// One generated alternative of a text completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextChoice {
    /// Position among the choices.
    pub index: u32,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
    /// The generated text.
    pub text: String,
    /// Present when log probabilities were requested.
    pub logprobs: Option<TextLogprobs>,
}

/// Success body of the legacy completion endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextCompletionResponse {
    /// Completion id.
    pub id: String,
    /// Always `text_completion`.
    pub object: String,
    /// Unix timestamp in seconds.
    pub created: i64,
    /// Model that produced the completion.
    pub model: String,
    /// Backend configuration fingerprint.
    pub system_fingerprint: Option<String>,
    /// Generated alternatives.
    pub choices: Vec<TextChoice>,
    /// Token accounting.
    pub usage: Usage,
}

/// Descriptor of an available model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Model id, usable in requests.
    pub id: String,
    /// Always `model`.
    pub object: String,
    /// Owning organization.
    pub owned_by: String,
}

/// Success body of the model listing endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelListResponse {
    /// Always `list`.
    pub object: String,
    /// The models, in service order.
    pub data: Vec<Model>,
}

/// Balance of the account in one currency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceInfo {
    /// `CNY` or `USD`.
    pub currency: String,
    /// Granted plus topped-up balance, as a decimal string.
    pub total_balance: String,
    /// Granted balance, as a decimal string.
    pub granted_balance: String,
    /// Topped-up balance, as a decimal string.
    pub topped_up_balance: String,
}

/// Success body of the balance endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceResponse {
    /// Whether the balance is sufficient for API calls.
    pub is_available: bool,
    /// Balance per currency.
    pub balance_infos: Vec<BalanceInfo>,
}

/// The discriminant of a [`Response`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// See [`ErrorResponse`].
    Error,
    /// See [`ChatCompletionResponse`].
    ChatCompletion,
    /// See [`TextCompletionResponse`].
    TextCompletion,
    /// See [`ModelListResponse`].
    ModelList,
    /// See [`BalanceResponse`].
    Balance,
}

impl Display for ResponseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseKind::Error => "error",
            ResponseKind::ChatCompletion => "chat completion",
            ResponseKind::TextCompletion => "text completion",
            ResponseKind::ModelList => "model list",
            ResponseKind::Balance => "balance",
        })
    }
}

/// Every response shape the service may send.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The service reported an error.
    Error(ErrorResponse),
    /// A chat completion.
    ChatCompletion(ChatCompletionResponse),
    /// A legacy text completion.
    TextCompletion(TextCompletionResponse),
    /// The list of models.
    ModelList(ModelListResponse),
    /// The account balance.
    Balance(BalanceResponse),
}

impl Response {
    /// Decodes a response body into the one shape it matches.
    ///
    /// The body is probed as a generic JSON object first: a non-null
    /// `error` wins, then an `is_available` marker selects the balance
    /// shape, and finally the `object` field picks among the completion
    /// and listing shapes. The raw bytes are then decoded again into the
    /// selected type.
    pub fn classify(body: &[u8]) -> Result<Self, ClassifyError> {
        let kind = Self::probe(&serde_json::from_slice(body)?)?;
        let resp = match kind {
            ResponseKind::Error => {
                Response::Error(serde_json::from_slice(body)?)
            }
            ResponseKind::ChatCompletion => {
                Response::ChatCompletion(serde_json::from_slice(body)?)
            }
            ResponseKind::TextCompletion => {
                Response::TextCompletion(serde_json::from_slice(body)?)
            }
            ResponseKind::ModelList => {
                Response::ModelList(serde_json::from_slice(body)?)
            }
            ResponseKind::Balance => {
                Response::Balance(serde_json::from_slice(body)?)
            }
        };
        Ok(resp)
    }

    fn probe(view: &Map<String, Value>) -> Result<ResponseKind, ClassifyError> {
        if view.get("error").is_some_and(|error| !error.is_null()) {
            return Ok(ResponseKind::Error);
        }
        if view.contains_key("is_available") {
            return Ok(ResponseKind::Balance);
        }
        let Some(object) = view.get("object") else {
            return Err(ClassifyError::UnknownShape);
        };
        match object.as_str() {
            Some("chat.completion") => Ok(ResponseKind::ChatCompletion),
            Some("text_completion") => Ok(ResponseKind::TextCompletion),
            Some("list") => Ok(ResponseKind::ModelList),
            Some(other) => Err(ClassifyError::UnknownObject(other.to_owned())),
            None => Err(ClassifyError::UnknownObject(object.to_string())),
        }
    }

    /// Returns the discriminant of this response.
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::Error(_) => ResponseKind::Error,
            Response::ChatCompletion(_) => ResponseKind::ChatCompletion,
            Response::TextCompletion(_) => ResponseKind::TextCompletion,
            Response::ModelList(_) => ResponseKind::ModelList,
            Response::Balance(_) => ResponseKind::Balance,
        }
    }

    /// Returns `true` for the error shape.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Splits off the error shape, so that `Ok` always holds a success
    /// shape.
    #[inline]
    pub fn into_result(self) -> Result<Self, ErrorBody> {
        match self {
            Response::Error(resp) => Err(resp.error),
            resp => Ok(resp),
        }
    }
}
