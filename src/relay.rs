//! The relay endpoint and the stream bridge.
//!
//! `POST /` takes a plain-text prompt, issues one streaming completion
//! call upstream, and re-streams the generated deltas back to the caller
//! as they arrive. The endpoint can be exercised with:
//!
//! ```bash
//! curl 127.0.0.1:8080 -N -X POST -H 'Content-Type: text/plain' \
//!   --data 'Can you explain why dogs are better than cats?'
//! ```
//!
//! The response body is raw text concatenation of the deltas, with no
//! envelope and no delimiter.
//!
//! Contract notes, deliberate and load-bearing:
//! - The 200 status is committed before the first upstream event can have
//!   occurred, because the body is streamed with unknown length. Callers
//!   must detect failure via stream truncation, not status code.
//! - A mid-stream upstream error is logged and absorbed; the response is
//!   left open, so the caller sees a stream that stops without
//!   terminating unless a completion event still follows.
//! - There is no request timeout, no retry, and no cancellation of the
//!   upstream call when the caller disconnects early.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Response, StatusCode},
    routing::post,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, future, stream};
use std::io;
use std::sync::Arc;
use tracing::{error, info};

use crate::provider::{EventStream, Provider, StreamEvent};

pub struct AppState {
    pub provider: Arc<dyn Provider>,
}

/// Build the single-route application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_prompt))
        .with_state(state)
}

/// Relay one prompt: issue the upstream streaming call, commit the
/// response headers, and hand the event stream to the bridge.
pub async fn handle_prompt(
    State(state): State<Arc<AppState>>,
    prompt: String,
) -> Response<Body> {
    // An empty prompt is forwarded as-is rather than rejected.
    info!("Received prompt: {} bytes", prompt.len());

    let events = match state.provider.stream_chat(&prompt).await {
        Ok(s) => s,
        Err(e) => {
            error!("{} request failed: {}", state.provider.name(), e);
            // Setup failed before anything was streamed. The failure is
            // visible only in the logs; the caller gets an empty body.
            return Response::builder()
                .status(StatusCode::OK)
                .body(Body::empty())
                .unwrap();
        }
    };

    // Headers go out now, while the upstream result is still unknown.
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("x-custom-header", "hello")
        .body(Body::from_stream(bridge_stream(events)))
        .unwrap()
}

/// Translate completion events into outbound body frames.
///
/// Per-request state machine: streaming while events arrive, closed only
/// by a completion event. Fragment deltas pass through verbatim and in
/// emission order. An error event is logged and absorbed without closing
/// the response. If the event stream ends without a completion event the
/// bridge parks instead of finalizing, so the caller observes a stalled
/// stream rather than a clean end.
pub fn bridge_stream(
    events: EventStream,
) -> impl Stream<Item = std::result::Result<Bytes, io::Error>> + Send {
    stream::unfold(events, |mut events| async move {
        loop {
            match events.next().await {
                Some(StreamEvent::Fragment { delta, .. }) => {
                    return Some((Ok(Bytes::from(delta)), events));
                }
                Some(StreamEvent::Error(e)) => {
                    error!("Upstream stream error: {}", e);
                }
                Some(StreamEvent::Done) => return None,
                None => {
                    // Ended without completing; hold the response open.
                    return future::pending().await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use std::time::Duration;

    fn fragment(delta: &str, snapshot: &str) -> StreamEvent {
        StreamEvent::Fragment {
            delta: delta.to_string(),
            snapshot: snapshot.to_string(),
        }
    }

    fn scripted(events: Vec<StreamEvent>) -> EventStream {
        Box::pin(stream::iter(events))
    }

    async fn collect_body(
        bridge: impl Stream<Item = std::result::Result<Bytes, io::Error>>,
    ) -> Vec<u8> {
        bridge
            .fold(Vec::new(), |mut acc, frame| async move {
                acc.extend_from_slice(&frame.unwrap());
                acc
            })
            .await
    }

    #[tokio::test]
    async fn test_fragments_forwarded_in_order() {
        let events = scripted(vec![
            fragment("Hello", "Hello"),
            fragment(" world", "Hello world"),
            fragment("!", "Hello world!"),
            StreamEvent::Done,
        ]);

        let body = collect_body(bridge_stream(events)).await;
        assert_eq!(body, b"Hello world!");
    }

    #[tokio::test]
    async fn test_empty_completion_closes_with_empty_body() {
        let events = scripted(vec![StreamEvent::Done]);
        let body = collect_body(bridge_stream(events)).await;
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_error_event_does_not_close_the_stream() {
        let events = scripted(vec![
            fragment("partial", "partial"),
            StreamEvent::Error(RelayError::UpstreamError("boom".to_string())),
        ]);

        let mut bridge = Box::pin(bridge_stream(events));

        let first = bridge.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"partial");

        // After the error the bridge must neither yield nor end.
        let stalled = tokio::time::timeout(Duration::from_millis(50), bridge.next()).await;
        assert!(stalled.is_err());
    }

    #[tokio::test]
    async fn test_stream_ending_without_done_stalls() {
        let events = scripted(vec![fragment("only", "only")]);
        let mut bridge = Box::pin(bridge_stream(events));

        let first = bridge.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"only");

        let stalled = tokio::time::timeout(Duration::from_millis(50), bridge.next()).await;
        assert!(stalled.is_err());
    }

    #[tokio::test]
    async fn test_deterministic_replay() {
        let script = || {
            scripted(vec![
                fragment("a", "a"),
                fragment("bc", "abc"),
                StreamEvent::Done,
            ])
        };

        let first = collect_body(bridge_stream(script())).await;
        let second = collect_body(bridge_stream(script())).await;
        assert_eq!(first, second);
        assert_eq!(first, b"abc");
    }
}
