use std::fmt::{self, Display};

use scout_core::Conversation;

/// The assistant message every session starts with.
pub const GREETING: &str =
    "Hi, I'm a chatbot who can search the web. How can I help you?";

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing.
    User,
    /// The agent.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One entry of the chat transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Creates a message written by the user.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a message written by the assistant.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns the author.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The transcript of one session, oldest first.
///
/// It only ever grows. Nothing is deduplicated or dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHistory {
    messages: Vec<ChatMessage>,
}

impl SessionHistory {
    /// Creates a history holding only the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// Appends a message.
    #[inline]
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Returns every message in display order.
    #[inline]
    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages, the greeting included.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`; the greeting is never removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the newest message.
    #[inline]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Converts the transcript into the agent's conversation format.
    pub(crate) fn to_conversation(&self) -> Conversation {
        let mut conversation = Conversation::new();
        for message in &self.messages {
            match message.role {
                Role::User => conversation.push_user(message.content.as_str()),
                Role::Assistant => {
                    conversation.push_assistant(message.content.as_str())
                }
            }
        }
        conversation
    }
}

impl Default for SessionHistory {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
