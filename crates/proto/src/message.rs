use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Violation;

/// Role of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Model output.
    Assistant,
    /// Result of a tool call.
    Tool,
}

impl Role {
    /// Returns the wire representation of the role.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Parses a wire role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields shared by every message variant.
///
/// On its own it acts as an untyped message whose role is only known at
/// runtime; the concrete variants embed it and pin the role.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicMessage {
    /// The role string sent to the service.
    pub role: String,
    /// The message text.
    pub content: String,
}

impl BasicMessage {
    /// Creates a message with the given role.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role: role.as_str().to_owned(),
            content: content.into(),
        }
    }

    /// Checks that the role is one of the known roles and that the
    /// content is not empty.
    pub fn validate(&self) -> Result<(), Violation> {
        if self.role.is_empty() {
            return Err(Violation::new("role", "role cannot be empty"));
        }
        if Role::parse(&self.role).is_none() {
            return Err(Violation::new(
                "role",
                "role must be one of system, user, assistant, or tool",
            ));
        }
        self.validate_content()
    }

    fn validate_as(&self, role: Role) -> Result<(), Violation> {
        if self.role != role.as_str() {
            return Err(Violation::new("role", format!("role must be {role}")));
        }
        self.validate_content()
    }

    #[inline]
    fn validate_content(&self) -> Result<(), Violation> {
        if self.content.is_empty() {
            return Err(Violation::new("content", "content cannot be empty"));
        }
        Ok(())
    }
}

/// System instructions for the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Role and content.
    #[serde(flatten)]
    pub base: BasicMessage,
    /// Optional participant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SystemMessage {
    /// Creates a system message.
    #[inline]
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            base: BasicMessage::new(Role::System, content),
            name: None,
        }
    }

    /// Checks the role and the content.
    #[inline]
    pub fn validate(&self) -> Result<(), Violation> {
        self.base.validate_as(Role::System)
    }
}

/// A user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMessage {
    /// Role and content.
    #[serde(flatten)]
    pub base: BasicMessage,
    /// Optional participant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserMessage {
    /// Creates a user message.
    #[inline]
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            base: BasicMessage::new(Role::User, content),
            name: None,
        }
    }

    /// Checks the role and the content.
    #[inline]
    pub fn validate(&self) -> Result<(), Violation> {
        self.base.validate_as(Role::User)
    }
}

/// A previous model turn, or a prefix the model should continue from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Role and content.
    #[serde(flatten)]
    pub base: BasicMessage,
    /// Optional participant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Asks the model to continue from this message (beta endpoint).
    #[serde(default, skip_serializing_if = "is_false")]
    pub prefix: bool,
    /// Reasoning text, only accepted together with `prefix`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    /// Tool calls the model made in this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl AssistantMessage {
    /// Creates an assistant message.
    #[inline]
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            base: BasicMessage::new(Role::Assistant, content),
            name: None,
            prefix: false,
            reasoning_content: None,
            tool_calls: None,
        }
    }

    /// Marks the message as a prefix for completion.
    #[inline]
    pub fn with_prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }

    /// Attaches reasoning text.
    #[inline]
    pub fn with_reasoning_content<S: Into<String>>(mut self, text: S) -> Self {
        self.reasoning_content = Some(text.into());
        self
    }

    /// Checks the role, the content and the prefix/reasoning coupling.
    pub fn validate(&self) -> Result<(), Violation> {
        self.base.validate_as(Role::Assistant)?;
        let has_reasoning = self
            .reasoning_content
            .as_deref()
            .is_some_and(|text| !text.is_empty());
        if has_reasoning && !self.prefix {
            return Err(Violation::new(
                "prefix",
                "prefix must be true if reasoning_content is not empty",
            ));
        }
        Ok(())
    }
}

impl From<ResponseMessage> for AssistantMessage {
    /// Turns a model reply back into a history message.
    ///
    /// Reasoning text is dropped: the service rejects it in history unless
    /// the message is a prefix.
    fn from(msg: ResponseMessage) -> Self {
        Self {
            base: BasicMessage::new(
                Role::Assistant,
                msg.content.unwrap_or_default(),
            ),
            name: None,
            prefix: false,
            reasoning_content: None,
            tool_calls: msg.tool_calls,
        }
    }
}

/// The result of a tool call, answering a previous assistant turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Role and content.
    #[serde(flatten)]
    pub base: BasicMessage,
    /// Id of the tool call this message answers.
    pub tool_call_id: String,
}

impl ToolMessage {
    /// Creates a tool result message.
    #[inline]
    pub fn new<I: Into<String>, S: Into<String>>(
        tool_call_id: I,
        content: S,
    ) -> Self {
        Self {
            base: BasicMessage::new(Role::Tool, content),
            tool_call_id: tool_call_id.into(),
        }
    }

    /// Checks the role, the content and the tool call id.
    pub fn validate(&self) -> Result<(), Violation> {
        self.base.validate_as(Role::Tool)?;
        if self.tool_call_id.is_empty() {
            return Err(Violation::new(
                "tool_call_id",
                "tool_call_id cannot be empty",
            ));
        }
        Ok(())
    }
}

/// A conversation turn in a chat request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A message whose variant is not known statically.
    Basic(BasicMessage),
    /// See [`SystemMessage`].
    System(SystemMessage),
    /// See [`UserMessage`].
    User(UserMessage),
    /// See [`AssistantMessage`].
    Assistant(AssistantMessage),
    /// See [`ToolMessage`].
    Tool(ToolMessage),
}

impl Message {
    /// Shorthand for a [`SystemMessage`].
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Message::System(SystemMessage::new(content))
    }

    /// Shorthand for a [`UserMessage`].
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message::User(UserMessage::new(content))
    }

    /// Shorthand for an [`AssistantMessage`].
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message::Assistant(AssistantMessage::new(content))
    }

    /// Shorthand for a [`ToolMessage`].
    #[inline]
    pub fn tool<I: Into<String>, S: Into<String>>(
        tool_call_id: I,
        content: S,
    ) -> Self {
        Message::Tool(ToolMessage::new(tool_call_id, content))
    }

    /// Validates the message according to its variant.
    pub fn validate(&self) -> Result<(), Violation> {
        match self {
            Message::Basic(msg) => msg.validate(),
            Message::System(msg) => msg.validate(),
            Message::User(msg) => msg.validate(),
            Message::Assistant(msg) => msg.validate(),
            Message::Tool(msg) => msg.validate(),
        }
    }

    /// Returns the role string.
    #[inline]
    pub fn role(&self) -> &str {
        &self.base().role
    }

    /// Returns the message text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.base().content
    }

    fn base(&self) -> &BasicMessage {
        match self {
            Message::Basic(msg) => msg,
            Message::System(msg) => &msg.base,
            Message::User(msg) => &msg.base,
            Message::Assistant(msg) => &msg.base,
            Message::Tool(msg) => &msg.base,
        }
    }
}

impl From<BasicMessage> for Message {
    fn from(msg: BasicMessage) -> Self {
        Message::Basic(msg)
    }
}

impl From<SystemMessage> for Message {
    fn from(msg: SystemMessage) -> Self {
        Message::System(msg)
    }
}

impl From<UserMessage> for Message {
    fn from(msg: UserMessage) -> Self {
        Message::User(msg)
    }
}

impl From<AssistantMessage> for Message {
    fn from(msg: AssistantMessage) -> Self {
        Message::Assistant(msg)
    }
}

impl From<ToolMessage> for Message {
    fn from(msg: ToolMessage) -> Self {
        Message::Tool(msg)
    }
}

/// The function invoked by a tool call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments, as generated by the model.
    pub arguments: String,
}

/// A tool call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique id of the call, echoed back in [`ToolMessage`].
    pub id: String,
    /// Always `function` at the moment.
    #[serde(rename = "type")]
    pub r#type: String,
    /// The call itself.
    pub function: FunctionCall,
}

/// The message carried by a chat completion choice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Usually `assistant`.
    pub role: String,
    /// Generated text; absent when the model only calls tools.
    #[serde(default)]
    pub content: Option<String>,
    /// Chain-of-thought text from reasoning models.
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Tool calls requested by the model.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[inline]
fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn basic(role: &str, content: &str) -> BasicMessage {
        BasicMessage {
            role: role.to_owned(),
            content: content.to_owned(),
        }
    }

    fn message_of(result: Result<(), Violation>) -> Option<String> {
        result.err().map(|v| v.message().to_owned())
    }

    #[test]
    fn test_basic_message() {
        let cases = [
            (basic("", "Hi"), Some("role cannot be empty")),
            (
                basic("invalid", "Hi"),
                Some("role must be one of system, user, assistant, or tool"),
            ),
            (basic("system", ""), Some("content cannot be empty")),
            (basic("user", "Hello"), None),
        ];
        for (msg, expected) in cases {
            assert_eq!(
                message_of(msg.validate()).as_deref(),
                expected,
                "{msg:?}"
            );
        }
    }

    #[test]
    fn test_variant_roles() {
        let mut system = SystemMessage::new("Be brief.");
        assert_eq!(system.validate(), Ok(()));
        system.base.role = "user".to_owned();
        assert_eq!(
            message_of(system.validate()).as_deref(),
            Some("role must be system")
        );

        let mut user = UserMessage::new("Hello");
        assert_eq!(user.validate(), Ok(()));
        user.base.role = "system".to_owned();
        assert_eq!(
            message_of(user.validate()).as_deref(),
            Some("role must be user")
        );

        let mut tool = ToolMessage::new("call_0", "42");
        assert_eq!(tool.validate(), Ok(()));
        tool.base.role = "assistant".to_owned();
        assert_eq!(
            message_of(tool.validate()).as_deref(),
            Some("role must be tool")
        );
    }

    #[test]
    fn test_role_checked_before_content() {
        let mut user = UserMessage::new("");
        user.base.role = "assistant".to_owned();
        let violation = user.validate().unwrap_err();
        assert_eq!(violation.field(), "role");

        let user = UserMessage::new("");
        assert_eq!(user.validate().unwrap_err().field(), "content");
    }

    #[test]
    fn test_assistant_prefix() {
        let msg = AssistantMessage::new("Answer").with_reasoning_content("Hmm");
        assert_eq!(
            message_of(msg.validate()).as_deref(),
            Some("prefix must be true if reasoning_content is not empty")
        );
        assert_eq!(msg.with_prefix(true).validate(), Ok(()));

        let msg = AssistantMessage::new("Answer").with_reasoning_content("");
        assert_eq!(msg.validate(), Ok(()));

        let mut msg = AssistantMessage::new("Answer");
        msg.base.role = "user".to_owned();
        assert_eq!(
            message_of(msg.validate()).as_deref(),
            Some("role must be assistant")
        );
    }

    #[test]
    fn test_empty_content_per_variant() {
        let cases = [
            Message::from(basic("user", "")),
            Message::system(""),
            Message::user(""),
            Message::assistant(""),
            Message::tool("call_0", ""),
        ];
        for msg in cases {
            let violation = msg.validate().unwrap_err();
            assert_eq!(violation.field(), "content", "{msg:?}");
            assert_eq!(violation.message(), "content cannot be empty");
        }

        // Content is checked before the tool call id.
        let msg = ToolMessage::new("", "");
        assert_eq!(msg.validate().unwrap_err().field(), "content");
    }

    #[test]
    fn test_tool_call_id_required() {
        let msg = ToolMessage::new("", "42");
        assert_eq!(
            message_of(msg.validate()).as_deref(),
            Some("tool_call_id cannot be empty")
        );
    }

    #[test]
    fn test_message_accessors() {
        let msg = Message::tool("call_1", "sunny");
        assert_eq!(msg.role(), "tool");
        assert_eq!(msg.content(), "sunny");
        assert_eq!(msg.validate(), Ok(()));

        let msg: Message = basic("wizard", "abracadabra").into();
        assert_eq!(msg.role(), "wizard");
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_serialize_flat() {
        let msg = Message::from(
            AssistantMessage::new("```python\n").with_prefix(true),
        );
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "assistant",
                "content": "```python\n",
                "prefix": true,
            })
        );

        let msg = Message::tool("call_0", "42");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "tool",
                "content": "42",
                "tool_call_id": "call_0",
            })
        );
    }

    #[test]
    fn test_reply_into_history() {
        let reply: ResponseMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "Hello!",
            "reasoning_content": "The user greets me.",
        }))
        .unwrap();
        let history = AssistantMessage::from(reply);
        assert_eq!(history.base.content, "Hello!");
        assert_eq!(history.reasoning_content, None);
        assert_eq!(history.validate(), Ok(()));
    }
}
