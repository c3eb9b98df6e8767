use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-specific message carried through the conversation untouched.
///
/// Some providers need the exact assistant message they produced (for
/// example one that requested tool calls) to be echoed back on the next
/// request. The agent cannot represent those messages with the neutral
/// types, so the provider wraps its own value here and unwraps it again
/// when building the next request.
///
/// Two opaque messages are equal when their ids are equal.
pub struct OpaqueMessage(Arc<dyn Payload>);

impl OpaqueMessage {
    /// Wraps `value` under the given `id`.
    ///
    /// The id must be unique within one conversation.
    #[inline]
    pub fn new<ID: Into<String>, T: Send + Sync + 'static>(
        id: ID,
        value: T,
    ) -> Self {
        Self(Arc::new(Tagged {
            id: id.into(),
            value,
        }))
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// Returns the wrapped value if it has type `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Clone for OpaqueMessage {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id()).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

trait Payload: Send + Sync {
    fn id(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

struct Tagged<T> {
    id: String,
    value: T,
}

impl<T: Send + Sync + 'static> Payload for Tagged<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }
}
