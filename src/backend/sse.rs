//! Incremental `text/event-stream` decoding for the progress endpoint.

use std::fmt::Display;

use futures_util::{pin_mut, Stream, StreamExt};

use crate::backend::{ProgressSnapshot, ProgressStream};
use crate::error::ConvertError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Unnamed events, `message` and `progress` carry snapshots; anything else
    /// (keep-alive pings and the like) is not ours to decode.
    pub fn is_progress(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message") | Some("progress"))
    }
}

/// Line-oriented SSE decoder that tolerates arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by this chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // retry and unknown fields are ignored
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            id: self.id.clone(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Adapt a raw body stream into progress snapshots.
///
/// The stream ends after a completed snapshot or the first error. A body that
/// ends before completion yields `ProgressStreamInterrupted`.
pub fn decode_snapshots<S, B, E>(body: S) -> ProgressStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        pin_mut!(body);
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ConvertError::ProgressStreamInterrupted(e.to_string()));
                    return;
                }
            };

            for event in decoder.feed(chunk.as_ref()) {
                if !event.is_progress() {
                    tracing::debug!(event = ?event.event, id = ?event.id, "skipping non-progress event");
                    continue;
                }
                tracing::trace!(id = ?event.id, data = %event.data, "progress event");
                match ProgressSnapshot::parse(&event.data) {
                    Ok(snapshot) => {
                        let done = snapshot.completed;
                        yield Ok(snapshot);
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        yield Err(ConvertError::ProgressStreamInterrupted(
            "server closed the stream before completion".to_string(),
        ));
    };

    Box::pin(stream)
}
