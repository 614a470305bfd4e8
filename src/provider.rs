use futures::Stream;
use std::future::Future;
use std::pin::Pin;

use crate::error::{RelayError, Result};

/// One event on an in-flight streaming completion.
///
/// The upstream surfaces three channels (text delta, failure, end of
/// stream); they are folded into a single tagged union so one handling
/// loop can consume them in arrival order.
#[derive(Debug)]
pub enum StreamEvent {
    /// Incremental piece of generated text, plus the cumulative text so
    /// far. Only the delta is forwarded; the snapshot is informational.
    Fragment { delta: String, snapshot: String },

    /// Upstream failure (network, malformed chunk, upstream-reported
    /// generation error). At most one per stream; non-terminal for the
    /// relay (see [`crate::relay`]).
    Error(RelayError),

    /// The stream finished normally. Fires at most once, after the last
    /// fragment.
    Done,
}

impl StreamEvent {
    /// Convenience accessor for `Fragment` delta text.
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Self::Fragment { delta, .. } => Some(delta.as_str()),
            _ => None,
        }
    }
}

/// Type alias for one in-flight streaming completion (the stream handle)
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Type alias for the future returned by stream_chat
pub type StreamFuture = Pin<Box<dyn Future<Output = Result<EventStream>> + Send>>;

/// Trait for text-generation providers that support streaming output
pub trait Provider: Send + Sync {
    /// Issue one streaming completion call for a single user-turn prompt.
    ///
    /// Resolves to the event stream once the upstream call is established;
    /// an `Err` means the call could not be issued at all (setup failure,
    /// before any event).
    fn stream_chat(&self, prompt: &str) -> StreamFuture;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}
