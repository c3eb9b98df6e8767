//! Conversation-related types.

use scout_model::{ModelMessage, OpaqueMessage, ToolCallResult};

/// Who produced a conversation item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TranscriptSource {
    /// Typed by the user.
    User,
    /// Produced by the model.
    Assistant,
    /// Returned by a tool.
    Tool,
}

/// An ordered list of messages exchanged with the model.
///
/// Callers build one from their visible chat history and hand it to
/// [`Agent::run`](crate::Agent::run). The agent clones it and extends the
/// clone with the new input and its intermediate steps, so the caller's
/// copy is never modified.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message.
    pub fn push_user<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        self.items.push(Item {
            msg: ModelMessage::User(text.clone()),
            transcript: text,
            source: TranscriptSource::User,
        });
    }

    /// Appends a plain assistant message.
    pub fn push_assistant<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        self.items.push(Item {
            msg: ModelMessage::Assistant(text.clone()),
            transcript: text,
            source: TranscriptSource::Assistant,
        });
    }

    /// Appends a model reply, keeping the provider's own message when there
    /// is one so tool calls survive the round trip.
    pub(crate) fn push_model_reply(
        &mut self,
        opaque_msg: Option<OpaqueMessage>,
        transcript: String,
    ) {
        let msg = match opaque_msg {
            Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
            // Downgrade to a text-only message.
            None => ModelMessage::Assistant(transcript.clone()),
        };
        self.items.push(Item {
            msg,
            transcript,
            source: TranscriptSource::Assistant,
        });
    }

    pub(crate) fn push_tool_result(&mut self, id: String, content: String) {
        self.items.push(Item {
            msg: ModelMessage::Tool(ToolCallResult {
                id,
                content: content.clone(),
            }),
            transcript: content,
            source: TranscriptSource::Tool,
        });
    }

    /// Returns the items, oldest first.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn messages(&self) -> impl Iterator<Item = ModelMessage> + '_ {
        self.items.iter().map(|item| item.msg.clone())
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
    pub(crate) source: TranscriptSource,
}

impl Item {
    /// Returns the transcript of this item.
    ///
    /// The transcript is the human readable text of the message. It is
    /// enough to display the item, not to rebuild the message for the
    /// model.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Returns who produced this item.
    #[inline]
    pub fn source(&self) -> TranscriptSource {
        self.source
    }
}
