use serde_json::Value;

/// Classification of one decoded stream frame.
///
/// The API tags frames with an `event` field; team-run variants carry the
/// same payload shape as their plain counterparts and are folded together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEventKind {
    /// `RunStarted` / `ReasoningStarted`: the run (and possibly a new
    /// session) exists now.
    Started,
    /// `RunContent` / `TeamRunContent`: a text increment or cumulative
    /// snapshot.
    Content,
    /// `RunCompleted` / `TeamRunCompleted`: terminal success; its content,
    /// when present, is authoritative.
    Completed,
    /// `RunError` / `TeamRunError`: terminal failure.
    Error,
    /// Any other tag. Still inspected for tool activity.
    Other(String),
}

/// One decoded frame from a streamed run, normalized for consumption.
///
/// Tool activity can ride on any frame via the singular `tool` field or the
/// `tools` array; both are gathered into `tools` as raw payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct RunEvent {
    pub kind: RunEventKind,
    /// Present once the server has created (or resolved) the session.
    pub session_id: Option<String>,
    /// The `content` field verbatim; `None` when absent or null.
    pub content: Option<Value>,
    /// Raw tool payloads carried on this frame.
    pub tools: Vec<Value>,
}

impl RunEvent {
    pub fn from_frame(frame: Value) -> Self {
        let tag = frame
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let kind = match tag {
            "RunStarted" | "ReasoningStarted" => RunEventKind::Started,
            "RunContent" | "TeamRunContent" => RunEventKind::Content,
            "RunCompleted" | "TeamRunCompleted" => RunEventKind::Completed,
            "RunError" | "TeamRunError" => RunEventKind::Error,
            other => RunEventKind::Other(other.to_string()),
        };
        let session_id = frame
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let mut tools = Vec::new();
        if let Some(tool) = frame.get("tool").filter(|v| v.is_object()) {
            tools.push(tool.clone());
        }
        if let Some(list) = frame.get("tools").and_then(Value::as_array) {
            tools.extend(list.iter().cloned());
        }
        let content = frame.get("content").filter(|v| !v.is_null()).cloned();
        Self {
            kind,
            session_id,
            content,
            tools,
        }
    }

    /// Whether this event terminates the stream (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RunEventKind::Completed | RunEventKind::Error)
    }
}
