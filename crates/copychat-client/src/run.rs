use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::ClientError;
use crate::history::content_to_text;
use crate::stream::{RunEvent, RunEventKind};
use crate::tools::{ToolInvocation, ToolTracker};
use crate::transport::JsonFrameDecoder;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

type EventStream =
    Pin<Box<dyn futures::Stream<Item = Result<RunEvent, ClientError>> + Send + 'static>>;

/// Final result of one streamed run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReply {
    /// The accumulated (or terminal-event authoritative) answer text.
    pub text: String,
    /// Deduplicated tool invocations ordered by creation time.
    pub tools: Vec<ToolInvocation>,
    /// Session id the server attached to this run, when one was seen.
    pub session_id: Option<String>,
}

/// Streaming handle for one run.
///
/// Use `next_event()` to consume events as they arrive (feeding a
/// `ReplyAccumulator` for live display) or `collect()` to drain to the final
/// reply. Dropping the handle abandons the run; the underlying connection is
/// the transport's scoped resource and needs no explicit cancel.
pub struct RunStream {
    events: EventStream,
}

impl RunStream {
    pub(crate) fn from_bytes(bytes: ByteStream) -> Self {
        Self {
            events: Box::pin(run_event_stream(bytes)),
        }
    }

    /// Waits for the next decoded event; `None` after the stream ends.
    pub async fn next_event(&mut self) -> Option<Result<RunEvent, ClientError>> {
        self.events.next().await
    }

    /// Drains the stream through an accumulator and returns the final reply.
    pub async fn collect(mut self) -> Result<RunReply, ClientError> {
        let mut reply = ReplyAccumulator::default();
        while let Some(next) = self.next_event().await {
            reply.push(&next?)?;
        }
        Ok(reply.finish())
    }
}

/// Decodes a streamed response body into `RunEvent`s.
///
/// Frames are extracted incrementally; on normal end of stream (and before
/// surfacing a read error) the trailing buffer gets one last-resort parse.
fn run_event_stream(
    bytes: ByteStream,
) -> impl futures::Stream<Item = Result<RunEvent, ClientError>> + Send {
    struct State {
        bytes: ByteStream,
        decoder: JsonFrameDecoder,
        pending: VecDeque<RunEvent>,
        error: Option<ClientError>,
        done: bool,
    }

    stream::try_unfold(
        State {
            bytes,
            decoder: JsonFrameDecoder::default(),
            pending: VecDeque::new(),
            error: None,
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return match state.error.take() {
                        Some(err) => Err(err),
                        None => Ok(None),
                    };
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.push_chunk(&chunk) {
                            state.pending.push_back(RunEvent::from_frame(frame));
                        }
                    }
                    Some(Err(e)) => {
                        if let Some(frame) = state.decoder.finish() {
                            state.pending.push_back(RunEvent::from_frame(frame));
                        }
                        state.error =
                            Some(ClientError::transport(format!("streaming read failed: {e}")));
                        state.done = true;
                    }
                    None => {
                        if let Some(frame) = state.decoder.finish() {
                            state.pending.push_back(RunEvent::from_frame(frame));
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}

/// Accumulates one streamed answer: text, tool activity, and session id.
///
/// The server may send either the full cumulative text on every content event
/// or pure deltas, with no mode flag; the mode is inferred per event. When
/// the new text starts with the previous raw payload, only the suffix beyond
/// it is appended; otherwise the payload is appended verbatim. The first
/// event is always taken as the initial full text.
#[derive(Default)]
pub struct ReplyAccumulator {
    text: String,
    last_raw: String,
    tools: ToolTracker,
    session_id: Option<String>,
}

impl ReplyAccumulator {
    /// Applies one event.
    ///
    /// An explicit error event aborts with the provider's payload; text
    /// accumulated so far stays readable through `text()`.
    pub fn push(&mut self, event: &RunEvent) -> Result<(), ClientError> {
        if event.kind == RunEventKind::Started
            && let Some(id) = &event.session_id
        {
            self.session_id = Some(id.clone());
        }
        for raw in &event.tools {
            self.tools.upsert_raw(raw);
        }
        match &event.kind {
            RunEventKind::Content => {
                if let Some(content) = &event.content {
                    self.push_content(content);
                }
            }
            RunEventKind::Completed => {
                // terminal content is authoritative when present
                if let Some(content) = &event.content {
                    debug!(chars = self.text.len(), "run completed");
                    let rendered = render_whole(content);
                    self.text = rendered.clone();
                    self.last_raw = rendered;
                }
            }
            RunEventKind::Error => {
                let message = event
                    .content
                    .as_ref()
                    .map(content_to_text)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "unknown run error".to_string());
                return Err(ClientError::run(message));
            }
            RunEventKind::Started | RunEventKind::Other(_) => {}
        }
        Ok(())
    }

    fn push_content(&mut self, content: &serde_json::Value) {
        match content {
            serde_json::Value::String(received) => {
                if self.last_raw.is_empty() {
                    self.text = received.clone();
                } else if received.starts_with(&self.last_raw) {
                    self.text.push_str(&received[self.last_raw.len()..]);
                } else {
                    self.text.push_str(received);
                }
                self.last_raw = received.clone();
            }
            other => {
                // structured payload: show it whole, not appended
                let rendered = render_whole(other);
                self.text = rendered.clone();
                self.last_raw = rendered;
            }
        }
    }

    /// The running answer text, for live display.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The session id observed so far, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Finalizes into a `RunReply` with tools ordered by creation time.
    pub fn finish(self) -> RunReply {
        RunReply {
            text: self.text,
            tools: self.tools.into_sorted(),
            session_id: self.session_id,
        }
    }
}

fn render_whole(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
