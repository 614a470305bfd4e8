use bytes::{Buf, BytesMut};

/// One decoded Server-Sent Events frame from the upstream stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Payload of one `data:` line (one completion chunk as JSON text)
    Data(String),
    /// The `data: [DONE]` sentinel terminating the stream
    Done,
}

/// Stateful decoder for the upstream's SSE byte stream.
///
/// Network chunks may split an event at any byte boundary, so the parser
/// buffers until it sees a full line. Blank lines (event separators) and
/// comment lines (leading `:`, used by some upstreams as keep-alives) are
/// skipped.
pub struct SseParser {
    buffer: BytesMut,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Feed new bytes and extract the complete frames they unlock
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(frame) = Self::parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Split one full line off the front of the buffer, without its
    /// terminator
    fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line = self.buffer.split_to(newline);
        self.buffer.advance(1);

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn parse_line(line: &str) -> Option<SseFrame> {
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let payload = line.strip_prefix("data:")?.trim_start();
        if payload == "[DONE]" {
            Some(SseFrame::Done)
        } else {
            Some(SseFrame::Data(payload.to_string()))
        }
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}
