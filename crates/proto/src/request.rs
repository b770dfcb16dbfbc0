use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Message, ValidationError, Violation};

/// General-purpose chat model.
pub const MODEL_DEEPSEEK_CHAT: &str = "deepseek-chat";
/// Reasoning model, replies carry `reasoning_content`.
pub const MODEL_DEEPSEEK_REASONER: &str = "deepseek-reasoner";

/// Plain text output.
pub const RESPONSE_FORMAT_TEXT: &str = "text";
/// Output constrained to a JSON object.
pub const RESPONSE_FORMAT_JSON_OBJECT: &str = "json_object";

/// The model must not call tools.
pub const TOOL_CHOICE_NONE: &str = "none";
/// The model decides whether to call tools.
pub const TOOL_CHOICE_AUTO: &str = "auto";
/// The model must call at least one tool.
pub const TOOL_CHOICE_REQUIRED: &str = "required";

const MAX_STOP_SEQUENCES: usize = 16;
const MAX_CHAT_TOKENS: u32 = 8192;
const MAX_LOGPROBS: u32 = 20;

/// The contract shared by all request payloads.
///
/// The dispatcher only talks to requests through this trait, so it can
/// send any endpoint's payload without knowing its concrete type.
pub trait ApiRequest: Send + Sync {
    /// Checks every field constraint and reports all violations at once.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Returns `true` if the request asks for a streamed response.
    fn stream_mode(&self) -> bool;

    /// Encodes the request as a JSON body.
    fn to_body(&self) -> Result<Vec<u8>, serde_json::Error>;
}

/// Output format of a chat completion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Either `text` or `json_object`.
    #[serde(rename = "type")]
    pub r#type: String,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        Self {
            r#type: RESPONSE_FORMAT_TEXT.to_owned(),
        }
    }
}

/// Options that only apply to streamed responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Sends a final chunk with token usage before `[DONE]`.
    pub include_usage: bool,
}

/// A function the model may call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// What the function does, used by the model to pick it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the parameters.
    pub parameters: Value,
}

/// A tool made available to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Always `function` at the moment.
    #[serde(rename = "type")]
    pub r#type: String,
    /// The function definition.
    pub function: FunctionDefinition,
}

impl Tool {
    /// Creates a function tool.
    pub fn function<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            r#type: "function".to_owned(),
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }
}

/// Request body of the chat completion endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// Model id.
    pub model: String,
    /// In `[-2, 2]`.
    pub frequency_penalty: f64,
    /// In `[1, 8192]`.
    pub max_tokens: u32,
    /// In `[-2, 2]`.
    pub presence_penalty: f64,
    /// Output format.
    pub response_format: ResponseFormat,
    /// Up to 16 stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Whether the response is streamed.
    pub stream: bool,
    /// Must be set iff `stream` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
    /// In `[0, 2]`.
    pub temperature: f64,
    /// In `[0, 1]`.
    pub top_p: f64,
    /// Tools the model may call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// One of `none`, `auto` or `required`.
    pub tool_choice: String,
    /// Whether to return token log probabilities.
    pub logprobs: bool,
    /// Number of alternatives per token, in `[0, 20]`. Requires `logprobs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
}

impl ChatRequest {
    /// Creates a request with the service defaults.
    pub fn new<S: Into<String>>(messages: Vec<Message>, model: S) -> Self {
        Self {
            messages,
            model: model.into(),
            frequency_penalty: 0.0,
            max_tokens: 4096,
            presence_penalty: 0.0,
            response_format: ResponseFormat::default(),
            stop: None,
            stream: false,
            stream_options: None,
            temperature: 1.0,
            top_p: 1.0,
            tools: None,
            tool_choice: TOOL_CHOICE_NONE.to_owned(),
            logprobs: false,
            top_logprobs: None,
        }
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum number of generated tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Makes tools available and sets the tool choice policy.
    #[inline]
    pub fn with_tools<S: Into<String>>(
        mut self,
        tools: Vec<Tool>,
        tool_choice: S,
    ) -> Self {
        self.tools = Some(tools);
        self.tool_choice = tool_choice.into();
        self
    }

    /// Requests the response as a JSON object.
    #[inline]
    pub fn with_json_output(mut self) -> Self {
        self.response_format.r#type = RESPONSE_FORMAT_JSON_OBJECT.to_owned();
        self
    }

    /// Enables streaming, with the usage chunk if `include_usage` is set.
    #[inline]
    pub fn with_stream(mut self, include_usage: bool) -> Self {
        self.stream = true;
        self.stream_options = Some(StreamOptions { include_usage });
        self
    }

    /// Enables log probabilities, with `top` alternatives per token.
    #[inline]
    pub fn with_logprobs(mut self, top: Option<u32>) -> Self {
        self.logprobs = true;
        self.top_logprobs = top;
        self
    }
}

impl ApiRequest for ChatRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errs = ValidationError::default();

        errs.check(
            !self.messages.is_empty(),
            "messages",
            "messages must contain at least one message",
        );
        errs.check(!self.model.is_empty(), "model", "model must be set");
        check_penalty(&mut errs, "frequency_penalty", self.frequency_penalty);
        errs.check(
            (1..=MAX_CHAT_TOKENS).contains(&self.max_tokens),
            "max_tokens",
            "max_tokens must be between 1 and 8192",
        );
        check_penalty(&mut errs, "presence_penalty", self.presence_penalty);
        errs.check(
            matches!(
                self.response_format.r#type.as_str(),
                RESPONSE_FORMAT_TEXT | RESPONSE_FORMAT_JSON_OBJECT
            ),
            "response_format",
            "response_format.type must be text or json_object",
        );
        check_stop(&mut errs, self.stop.as_deref());
        check_stream_options(&mut errs, self.stream, &self.stream_options);
        check_sampling(&mut errs, self.temperature, self.top_p);

        match self.tool_choice.as_str() {
            TOOL_CHOICE_NONE | TOOL_CHOICE_AUTO => {}
            TOOL_CHOICE_REQUIRED => {
                let has_tools =
                    self.tools.as_ref().is_some_and(|tools| !tools.is_empty());
                errs.check(
                    has_tools,
                    "tools",
                    "tools must be defined when tool_choice is required",
                );
            }
            _ => errs.push(Violation::new(
                "tool_choice",
                "tool_choice must be one of none, auto, or required",
            )),
        }

        if let Some(top_logprobs) = self.top_logprobs {
            errs.check(
                self.logprobs,
                "logprobs",
                "logprobs must be true when top_logprobs is set",
            );
            errs.check(
                top_logprobs <= MAX_LOGPROBS,
                "top_logprobs",
                "top_logprobs must be between 0 and 20",
            );
        }

        for (idx, msg) in self.messages.iter().enumerate() {
            if let Err(violation) = msg.validate() {
                errs.push(Violation::new(
                    format!("messages[{idx}]"),
                    format!("messages[{idx}]: {violation}"),
                ));
            }
        }

        errs.finish()
    }

    #[inline]
    fn stream_mode(&self) -> bool {
        self.stream
    }

    #[inline]
    fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Request body of the legacy (FIM) completion endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model id.
    pub model: String,
    /// Text to complete.
    pub prompt: String,
    /// Echo the prompt back in the completion.
    pub echo: bool,
    /// In `[-2, 2]`.
    pub frequency_penalty: f64,
    /// Number of alternatives per token, in `[0, 20]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,
    /// At least 1.
    pub max_tokens: u32,
    /// In `[-2, 2]`.
    pub presence_penalty: f64,
    /// Up to 16 stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Whether the response is streamed.
    pub stream: bool,
    /// Must be set iff `stream` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
    /// Text that follows the completion (fill-in-the-middle).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// In `[0, 2]`.
    pub temperature: f64,
    /// In `[0, 1]`.
    pub top_p: f64,
}

impl CompletionRequest {
    /// Creates a request with the service defaults.
    pub fn new<M: Into<String>, P: Into<String>>(model: M, prompt: P) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            echo: false,
            frequency_penalty: 0.0,
            logprobs: None,
            max_tokens: 1024,
            presence_penalty: 0.0,
            stop: None,
            stream: false,
            stream_options: None,
            suffix: None,
            temperature: 1.0,
            top_p: 1.0,
        }
    }

    /// Sets the text that should follow the completion.
    #[inline]
    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Sets the maximum number of generated tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enables streaming, with the usage chunk if `include_usage` is set.
    #[inline]
    pub fn with_stream(mut self, include_usage: bool) -> Self {
        self.stream = true;
        self.stream_options = Some(StreamOptions { include_usage });
        self
    }
}

impl ApiRequest for CompletionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errs = ValidationError::default();

        errs.check(!self.model.is_empty(), "model", "model must be set");
        errs.check(!self.prompt.is_empty(), "prompt", "prompt must be set");
        check_penalty(&mut errs, "frequency_penalty", self.frequency_penalty);
        errs.check(
            self.logprobs.is_none_or(|n| n <= MAX_LOGPROBS),
            "logprobs",
            "logprobs must be between 0 and 20",
        );
        errs.check(
            self.max_tokens >= 1,
            "max_tokens",
            "max_tokens must be greater than 0",
        );
        check_penalty(&mut errs, "presence_penalty", self.presence_penalty);
        check_stop(&mut errs, self.stop.as_deref());
        check_stream_options(&mut errs, self.stream, &self.stream_options);
        check_sampling(&mut errs, self.temperature, self.top_p);

        errs.finish()
    }

    #[inline]
    fn stream_mode(&self) -> bool {
        self.stream
    }

    #[inline]
    fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ------------------------
// Shared validation rules
// ------------------------

#[inline]
fn check_penalty(errs: &mut ValidationError, field: &str, value: f64) {
    errs.check(
        (-2.0..=2.0).contains(&value),
        field,
        format!("{field} must be between -2 and 2"),
    );
}

#[inline]
fn check_stop(errs: &mut ValidationError, stop: Option<&[String]>) {
    errs.check(
        stop.is_none_or(|stop| stop.len() <= MAX_STOP_SEQUENCES),
        "stop",
        "stop must contain at most 16 sequences",
    );
}

fn check_stream_options(
    errs: &mut ValidationError,
    stream: bool,
    options: &Option<StreamOptions>,
) {
    match (stream, options) {
        (true, None) => errs.push(Violation::new(
            "stream_options",
            "stream_options must be set when stream is true",
        )),
        (false, Some(_)) => errs.push(Violation::new(
            "stream_options",
            "stream_options must be unset when stream is false",
        )),
        _ => {}
    }
}

fn check_sampling(errs: &mut ValidationError, temperature: f64, top_p: f64) {
    errs.check(
        (0.0..=2.0).contains(&temperature),
        "temperature",
        "temperature must be between 0 and 2",
    );
    errs.check(
        (0.0..=1.0).contains(&top_p),
        "top_p",
        "top_p must be between 0 and 1",
    );
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chat_request() -> ChatRequest {
        ChatRequest::new(vec![Message::user("Hello")], MODEL_DEEPSEEK_CHAT)
    }

    fn fields(err: &ValidationError) -> Vec<&str> {
        err.violations().iter().map(Violation::field).collect()
    }

    #[test]
    fn test_default_chat_request_is_valid() {
        assert_eq!(chat_request().validate(), Ok(()));
        assert!(!chat_request().stream_mode());
    }

    #[test]
    fn test_chat_single_rules() {
        let cases: [(fn(&mut ChatRequest), &str); 17] = [
            (|r| r.messages.clear(), "messages"),
            (|r| r.model.clear(), "model"),
            (|r| r.frequency_penalty = 3.0, "frequency_penalty"),
            (|r| r.frequency_penalty = -2.5, "frequency_penalty"),
            (|r| r.presence_penalty = f64::NAN, "presence_penalty"),
            (|r| r.max_tokens = 0, "max_tokens"),
            (|r| r.max_tokens = 8193, "max_tokens"),
            (|r| r.response_format.r#type = "xml".into(), "response_format"),
            (|r| r.stop = Some(vec![String::new(); 17]), "stop"),
            (|r| r.stream = true, "stream_options"),
            (|r| r.stream_options = Some(Default::default()), "stream_options"),
            (|r| r.temperature = 2.1, "temperature"),
            (|r| r.top_p = -0.1, "top_p"),
            (|r| r.tool_choice = "sometimes".into(), "tool_choice"),
            (|r| r.tool_choice = TOOL_CHOICE_REQUIRED.into(), "tools"),
            (|r| r.top_logprobs = Some(3), "logprobs"),
            (|r| r.messages.push(Message::user("")), "messages[1]"),
        ];
        for (mutate, field) in cases {
            let mut req = chat_request();
            mutate(&mut req);
            let err = req.validate().unwrap_err();
            assert_eq!(fields(&err), [field], "{req:?}");
        }
    }

    #[test]
    fn test_chat_boundaries_are_inclusive() {
        let mut req = chat_request();
        req.frequency_penalty = -2.0;
        req.presence_penalty = 2.0;
        req.max_tokens = 8192;
        req.temperature = 0.0;
        req.top_p = 1.0;
        req.stop = Some(vec!["\n".to_owned(); 16]);
        req.logprobs = true;
        req.top_logprobs = Some(20);
        assert_eq!(req.validate(), Ok(()));

        req.max_tokens = 1;
        req.top_logprobs = Some(0);
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_chat_violations_accumulate() {
        let mut req = chat_request();
        req.frequency_penalty = 3.0;
        req.top_p = 2.0;
        let err = req.validate().unwrap_err();
        assert_eq!(fields(&err), ["frequency_penalty", "top_p"]);
        assert_eq!(
            err.to_string(),
            "frequency_penalty must be between -2 and 2\n\
             top_p must be between 0 and 1"
        );
    }

    #[test]
    fn test_chat_top_logprobs_reports_both_rules() {
        let mut req = chat_request();
        req.top_logprobs = Some(21);
        let err = req.validate().unwrap_err();
        assert_eq!(fields(&err), ["logprobs", "top_logprobs"]);
    }

    #[test]
    fn test_chat_required_tools() {
        let tool = Tool::function(
            "get_weather",
            "Gets the weather of a city.",
            json!({ "type": "object", "properties": {} }),
        );
        let req = chat_request().with_tools(vec![], TOOL_CHOICE_REQUIRED);
        assert!(req.validate().unwrap_err().has_field("tools"));
        let req = chat_request().with_tools(vec![tool], TOOL_CHOICE_REQUIRED);
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_chat_stream_mode() {
        let req = chat_request().with_stream(true);
        assert!(req.stream_mode());
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_chat_body() {
        let body = chat_request().with_temperature(0.5).to_body().unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({
                "messages": [{ "role": "user", "content": "Hello" }],
                "model": "deepseek-chat",
                "frequency_penalty": 0.0,
                "max_tokens": 4096,
                "presence_penalty": 0.0,
                "response_format": { "type": "text" },
                "stream": false,
                "temperature": 0.5,
                "top_p": 1.0,
                "tool_choice": "none",
                "logprobs": false,
            })
        );
    }

    #[test]
    fn test_default_completion_request_is_valid() {
        let req = CompletionRequest::new(MODEL_DEEPSEEK_CHAT, "Once upon");
        assert_eq!(req.validate(), Ok(()));
        assert_eq!(req.max_tokens, 1024);
    }

    #[test]
    fn test_completion_violations_accumulate() {
        let mut req = CompletionRequest::new("", "");
        req.logprobs = Some(21);
        req.max_tokens = 0;
        req.presence_penalty = -3.0;
        req.stream = true;
        req.temperature = -1.0;
        let err = req.validate().unwrap_err();
        assert_eq!(
            fields(&err),
            [
                "model",
                "prompt",
                "logprobs",
                "max_tokens",
                "presence_penalty",
                "stream_options",
                "temperature",
            ]
        );
    }

    #[test]
    fn test_completion_body_skips_unset() {
        let req = CompletionRequest::new(MODEL_DEEPSEEK_CHAT, "def fib(n):")
            .with_suffix("    return fib(n - 1) + fib(n - 2)")
            .with_max_tokens(128);
        let body: Value =
            serde_json::from_slice(&req.to_body().unwrap()).unwrap();
        assert_eq!(body["suffix"], "    return fib(n - 1) + fib(n - 2)");
        assert_eq!(body["max_tokens"], 128);
        assert!(body.get("logprobs").is_none());
        assert!(body.get("stream_options").is_none());
    }
}
