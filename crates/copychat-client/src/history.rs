use serde_json::{Map, Value};

use crate::tools::ToolInvocation;

/// Who said a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Normalized unit of conversation history, shared by live streaming and
/// session replay.
///
/// An assistant message may carry empty content only when it has at least one
/// tool invocation, so tool-only turns stay visible.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Seconds since epoch; messages are sorted ascending before display.
    pub created_at: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

/// Renders an arbitrarily shaped content payload as readable text.
///
/// Strings pass through. Arrays prefer parts tagged `type == "text"` joined
/// with spaces, else every part is stringified. Maps recurse through
/// `content` → `text` → `message` → `output` before falling back to pretty
/// JSON; an empty map is empty text.
pub fn content_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let text_parts: Vec<&str> = items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect();
            if !text_parts.is_empty() {
                return text_parts.join(" ");
            }
            items
                .iter()
                .map(scalar_to_text)
                .collect::<Vec<_>>()
                .join(" ")
        }
        Value::Object(map) => {
            for key in ["content", "text", "message", "output"] {
                if let Some(inner) = map.get(key) {
                    let text = content_to_text(inner);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
            if map.is_empty() {
                return String::new();
            }
            serde_json::to_string_pretty(value).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

fn scalar_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rebuilds a chronologically ordered conversation from the raw run records
/// the history endpoint returns.
///
/// Record shapes vary between API versions, so every field access is
/// optional: resolution walks an ordered precedence list per side and a
/// record that resolves to nothing is skipped rather than surfaced as an
/// error.
pub fn reconstruct_conversation(records: &[Value]) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    for record in records {
        let Some(entry) = record.as_object().filter(|m| !m.is_empty()) else {
            continue;
        };
        let record_created_at = entry.get("created_at").and_then(Value::as_f64).unwrap_or(0.0);

        let (user_text, user_created_at) = resolve_user(entry, record_created_at);
        if !user_text.trim().is_empty() {
            messages.push(ChatMessage {
                role: Role::User,
                content: user_text.clone(),
                created_at: user_created_at,
                tool_calls: Vec::new(),
            });
        }

        let (assistant_text, assistant_created_at) =
            resolve_assistant(entry, record_created_at, &user_text);
        let tool_calls: Vec<ToolInvocation> = resolve_tools(entry)
            .iter()
            .filter_map(ToolInvocation::from_value)
            .collect();

        if !assistant_text.trim().is_empty() {
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: assistant_text,
                created_at: assistant_created_at,
                tool_calls,
            });
        } else if !tool_calls.is_empty() {
            // tool-only turn: keep the invocation visible
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: String::new(),
                created_at: assistant_created_at,
                tool_calls,
            });
        }
    }
    messages.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    messages
}

/// User text: `run_input` → `message` (possibly nested) → `input`.
fn resolve_user(entry: &Map<String, Value>, record_created_at: f64) -> (String, f64) {
    let mut text = String::new();
    let mut created_at = record_created_at;
    if let Some(input) = entry.get("run_input") {
        text = content_to_text(input);
    }
    if text.trim().is_empty()
        && let Some(message) = entry.get("message")
    {
        match message.as_object() {
            Some(msg) => {
                if let Some(inner) = msg.get("content").or_else(|| msg.get("text")) {
                    text = content_to_text(inner);
                }
                created_at = msg
                    .get("created_at")
                    .and_then(Value::as_f64)
                    .unwrap_or(record_created_at);
            }
            None => text = content_to_text(message),
        }
    }
    if text.trim().is_empty()
        && let Some(input) = entry.get("input")
    {
        text = content_to_text(input);
    }
    (text, created_at)
}

/// Assistant text: `run_output` → `response` (possibly nested) → `output` →
/// top-level `content`, the last only when it differs from the user text of
/// the same record.
fn resolve_assistant(
    entry: &Map<String, Value>,
    record_created_at: f64,
    user_text: &str,
) -> (String, f64) {
    let mut text = String::new();
    let mut created_at = record_created_at;
    if let Some(output) = entry.get("run_output") {
        text = content_to_text(output);
    }
    if text.trim().is_empty()
        && let Some(response) = entry.get("response")
    {
        match response.as_object() {
            Some(resp) => {
                if let Some(inner) = resp.get("content").or_else(|| resp.get("text")) {
                    text = content_to_text(inner);
                }
                created_at = resp
                    .get("created_at")
                    .and_then(Value::as_f64)
                    .unwrap_or(record_created_at);
            }
            None => text = content_to_text(response),
        }
    }
    if text.trim().is_empty()
        && let Some(output) = entry.get("output")
    {
        text = content_to_text(output);
    }
    if text.trim().is_empty()
        && let Some(content) = entry.get("content")
    {
        let rendered = content_to_text(content);
        if rendered != user_text {
            text = rendered;
        }
    }
    (text, created_at)
}

/// Tool payloads: `tool_calls` → `tools` → singular `tool` at the record's
/// top level, else the same fields nested inside `response`.
fn resolve_tools(entry: &Map<String, Value>) -> Vec<Value> {
    let top = tool_values_from(entry);
    if !top.is_empty() {
        return top;
    }
    entry
        .get("response")
        .and_then(Value::as_object)
        .map(tool_values_from)
        .unwrap_or_default()
}

fn tool_values_from(map: &Map<String, Value>) -> Vec<Value> {
    if let Some(list) = map.get("tool_calls").and_then(Value::as_array) {
        return list.clone();
    }
    if let Some(list) = map.get("tools").and_then(Value::as_array) {
        return list.clone();
    }
    if let Some(tool) = map.get("tool").filter(|v| v.is_object()) {
        return vec![tool.clone()];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_run_input_and_output_become_a_user_and_assistant_pair() {
        let records = vec![json!({
            "run_input": "write a hook",
            "run_output": "here is a hook",
            "created_at": 42.0
        })];
        let messages = reconstruct_conversation(&records);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "write a hook");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "here is a hook");
        assert_eq!(messages[1].created_at, 42.0);
    }

    #[test]
    fn empty_output_yields_only_the_user_message() {
        let records = vec![json!({ "run_input": "hi", "run_output": "" })];
        let messages = reconstruct_conversation(&records);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hi");
    }

    #[test]
    fn tool_only_turn_emits_an_empty_assistant_message_with_the_invocation() {
        let records = vec![json!({
            "run_input": "hi",
            "tool_calls": [{ "tool_name": "search", "created_at": 1.0 }]
        })];
        let messages = reconstruct_conversation(&records);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].content.is_empty());
        assert_eq!(messages[1].tool_calls.len(), 1);
        assert_eq!(messages[1].tool_calls[0].name, "search");
    }

    #[test]
    fn messages_are_sorted_ascending_by_timestamp() {
        let records = vec![
            json!({ "run_input": "third", "created_at": 30.0 }),
            json!({ "run_input": "first", "created_at": 10.0 }),
            json!({ "run_input": "second", "created_at": 20.0 }),
        ];
        let contents: Vec<_> = reconstruct_conversation(&records)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn missing_timestamps_sort_earliest() {
        let records = vec![
            json!({ "run_input": "dated", "created_at": 5.0 }),
            json!({ "run_input": "undated" }),
        ];
        let messages = reconstruct_conversation(&records);
        assert_eq!(messages[0].content, "undated");
        assert_eq!(messages[0].created_at, 0.0);
    }

    #[test]
    fn message_and_response_shapes_resolve_with_nested_timestamps() {
        let records = vec![json!({
            "message": { "content": "question", "created_at": 1.0 },
            "response": {
                "text": "answer",
                "created_at": 2.0,
                "tool_calls": [{ "tool_name": "search", "created_at": 1.5 }]
            }
        })];
        let messages = reconstruct_conversation(&records);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "question");
        assert_eq!(messages[0].created_at, 1.0);
        assert_eq!(messages[1].content, "answer");
        assert_eq!(messages[1].created_at, 2.0);
        assert_eq!(messages[1].tool_calls.len(), 1);
    }

    #[test]
    fn top_level_content_is_used_only_when_it_differs_from_user_text() {
        let duplicated = vec![json!({ "run_input": "hi", "content": "hi" })];
        let messages = reconstruct_conversation(&duplicated);
        assert_eq!(messages.len(), 1);

        let distinct = vec![json!({ "run_input": "hi", "content": "hello there" })];
        let messages = reconstruct_conversation(&distinct);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "hello there");
    }

    #[test]
    fn empty_and_non_object_records_are_skipped() {
        let records = vec![json!(null), json!({}), json!("noise"), json!(7)];
        assert!(reconstruct_conversation(&records).is_empty());
    }

    #[test]
    fn unresolvable_record_is_silently_omitted() {
        let records = vec![json!({ "unrelated": "field" })];
        assert!(reconstruct_conversation(&records).is_empty());
    }

    #[test]
    fn content_to_text_joins_typed_text_parts() {
        let value = json!([
            { "type": "text", "text": "hello" },
            { "type": "image", "url": "x" },
            { "type": "text", "text": "world" }
        ]);
        assert_eq!(content_to_text(&value), "hello world");
    }

    #[test]
    fn content_to_text_stringifies_untyped_parts() {
        let value = json!(["a", 1, true]);
        assert_eq!(content_to_text(&value), "a 1 true");
    }

    #[test]
    fn content_to_text_recurses_through_known_keys_in_order() {
        let value = json!({ "message": { "content": "inner" } });
        assert_eq!(content_to_text(&value), "inner");
        // `content` is tried before `text`
        let value = json!({ "text": "fallback", "content": "primary" });
        assert_eq!(content_to_text(&value), "primary");
    }

    #[test]
    fn content_to_text_pretty_prints_unrecognized_maps() {
        let value = json!({ "score": 3 });
        let rendered = content_to_text(&value);
        assert!(rendered.contains("\"score\""));
        assert_eq!(content_to_text(&json!({})), "");
    }
}
