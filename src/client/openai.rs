use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use reqwest::Client;
use tracing::info;

use crate::config::OpenAiConfig;
use crate::error::{RelayError, Result};
use crate::models::{ChatChunk, ChatRequest, UpstreamErrorEnvelope};
use crate::provider::{EventStream, Provider, StreamEvent, StreamFuture};
use crate::streaming::{SseFrame, SseParser};

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        // No request timeout: a completion may legitimately stream for
        // arbitrarily long.
        let client = Client::builder().build().map_err(|e| {
            RelayError::InternalError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }
}

impl Provider for OpenAiClient {
    fn stream_chat(&self, prompt: &str) -> StreamFuture {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let request = ChatRequest::user_turn(&self.config.model, prompt);
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();

        Box::pin(async move { Self::stream_chat_impl(url, request, client, api_key).await })
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

impl OpenAiClient {
    async fn stream_chat_impl(
        url: String,
        request: ChatRequest,
        client: Client,
        api_key: String,
    ) -> Result<EventStream> {
        info!(
            "OpenAI: requesting streaming completion from {} with model {}",
            url, request.model
        );

        let response = client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamError(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        info!("OpenAI responded with status: {}", status);

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RelayError::UpstreamError(format!(
                "OpenAI API error {}: {}",
                status, error_body
            )));
        }

        Ok(Box::pin(decode_events(response.bytes_stream())))
    }
}

/// Decode the upstream SSE byte stream into completion events.
///
/// Each `data:` chunk's text delta becomes a `Fragment` carrying the
/// cumulative snapshot; `[DONE]` becomes `Done`; transport failures,
/// malformed chunks and upstream-reported errors become `Error` events.
/// Anything arriving after `[DONE]` is discarded.
fn decode_events(
    bytes: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    let mut parser = SseParser::new();
    let mut snapshot = String::new();
    let mut finished = false;

    bytes
        .map(move |chunk_result| {
            let mut events = Vec::new();
            if finished {
                return events;
            }

            match chunk_result {
                Ok(chunk) => {
                    for frame in parser.feed(&chunk) {
                        match frame {
                            SseFrame::Data(payload) => {
                                if let Some(event) = decode_chunk(&payload, &mut snapshot) {
                                    events.push(event);
                                }
                            }
                            SseFrame::Done => {
                                events.push(StreamEvent::Done);
                                finished = true;
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    events.push(StreamEvent::Error(RelayError::UpstreamError(format!(
                        "OpenAI stream failed: {}",
                        e
                    ))));
                }
            }

            events
        })
        .flat_map(stream::iter)
}

fn decode_chunk(payload: &str, snapshot: &mut String) -> Option<StreamEvent> {
    // Error envelopes arrive on the same data channel as deltas, so they
    // must be told apart before the chunk parse.
    if let Ok(envelope) = serde_json::from_str::<UpstreamErrorEnvelope>(payload) {
        return Some(StreamEvent::Error(RelayError::UpstreamError(format!(
            "OpenAI reported error: {}",
            envelope.error.message
        ))));
    }

    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => {
            let delta = chunk.delta_text()?;
            snapshot.push_str(delta);
            Some(StreamEvent::Fragment {
                delta: delta.to_string(),
                snapshot: snapshot.clone(),
            })
        }
        Err(e) => Some(StreamEvent::Error(RelayError::InvalidChunk(format!(
            "{} - chunk was: {}",
            e, payload
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_chunks(parts: &[&str]) -> Vec<reqwest::Result<Bytes>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect()
    }

    fn delta_line(text: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{}\"}},\"finish_reason\":null}}]}}\n\n",
            text
        )
    }

    #[tokio::test]
    async fn test_decode_fragments_then_done() {
        let wire = format!("{}{}data: [DONE]\n\n", delta_line("Hello"), delta_line(" world"));
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[&wire]))).collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].as_delta(), Some("Hello"));
        assert_eq!(events[1].as_delta(), Some(" world"));
        match &events[1] {
            StreamEvent::Fragment { snapshot, .. } => assert_eq!(snapshot, "Hello world"),
            other => panic!("expected fragment, got {:?}", other),
        }
        assert!(matches!(events[2], StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_decode_event_split_across_network_chunks() {
        let wire = delta_line("chunked");
        let (a, b) = wire.split_at(17);
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[a, b, "data: [DONE]\n\n"])))
                .collect()
                .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_delta(), Some("chunked"));
        assert!(matches!(events[1], StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_decode_role_and_finish_chunks_emit_nothing() {
        let wire = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[wire]))).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_decode_malformed_chunk_becomes_error_event() {
        let wire = "data: {not json}\n\n";
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[wire]))).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            StreamEvent::Error(RelayError::InvalidChunk(_))
        ));
    }

    #[tokio::test]
    async fn test_decode_upstream_error_envelope() {
        let wire =
            "data: {\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n\n";
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[wire]))).collect().await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(RelayError::UpstreamError(msg)) => {
                assert!(msg.contains("overloaded"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_discards_data_after_done() {
        let wire = format!("data: [DONE]\n\n{}", delta_line("late"));
        let events: Vec<StreamEvent> =
            decode_events(stream::iter(byte_chunks(&[&wire]))).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Done));
    }
}
