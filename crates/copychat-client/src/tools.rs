use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

/// One external-tool call the agent made while answering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolInvocation {
    /// Provider call id, or `"{name}-{created_at}"` when the provider sent
    /// none. Used to deduplicate partial records within one streamed answer.
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
    /// Opaque result payload, absent until the tool finishes.
    pub result: Option<Value>,
    pub failed: bool,
    /// Seconds since epoch; drives display order and the synthesized id.
    pub created_at: f64,
}

impl ToolInvocation {
    /// Parses a raw tool payload. Returns `None` for non-object payloads.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let name = obj
            .get("tool_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let created_at = obj
            .get("created_at")
            .and_then(Value::as_f64)
            .unwrap_or_else(now_secs);
        let id = obj
            .get("tool_call_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{name}-{created_at}"));
        let arguments = obj
            .get("tool_args")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let result = obj.get("content").filter(|v| !v.is_null()).cloned();
        let failed = obj
            .get("tool_call_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(Self {
            id,
            name,
            arguments,
            result,
            failed,
            created_at,
        })
    }

    /// Merges a later partial record with the same id into this one.
    ///
    /// Arguments and result are overwritten only by non-empty values; the
    /// error flag follows the most recent explicit value and keeps its state
    /// when the newer record omits it. Name and creation time never change.
    pub fn merge_value(&mut self, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            return;
        };
        if let Some(args) = obj.get("tool_args").and_then(Value::as_object)
            && !args.is_empty()
        {
            self.arguments = args.clone();
        }
        if let Some(result) = obj.get("content").filter(|v| !v.is_null()) {
            self.result = Some(result.clone());
        }
        if let Some(failed) = obj.get("tool_call_error").and_then(Value::as_bool) {
            self.failed = failed;
        }
    }
}

/// Insertion-ordered collection of tool invocations, deduplicated by id.
#[derive(Default)]
pub(crate) struct ToolTracker {
    entries: Vec<ToolInvocation>,
}

impl ToolTracker {
    pub fn upsert_raw(&mut self, raw: &Value) {
        let Some(parsed) = ToolInvocation::from_value(raw) else {
            return;
        };
        match self.entries.iter_mut().find(|t| t.id == parsed.id) {
            Some(existing) => existing.merge_value(raw),
            None => self.entries.push(parsed),
        }
    }

    /// Consumes the tracker, returning invocations ordered by creation time.
    /// The sort is stable, so same-timestamp entries keep arrival order.
    pub fn into_sorted(mut self) -> Vec<ToolInvocation> {
        self.entries
            .sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        self.entries
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_call_id_wins_over_synthesized_identity() {
        let tool = ToolInvocation::from_value(&json!({
            "tool_call_id": "call-7",
            "tool_name": "web_search",
            "created_at": 100.0
        }))
        .unwrap();
        assert_eq!(tool.id, "call-7");

        let tool = ToolInvocation::from_value(&json!({
            "tool_name": "web_search",
            "created_at": 100.0
        }))
        .unwrap();
        assert_eq!(tool.id, "web_search-100");
    }

    #[test]
    fn later_non_empty_arguments_replace_earlier_empty_ones() {
        let mut tracker = ToolTracker::default();
        tracker.upsert_raw(&json!({
            "tool_call_id": "call-1",
            "tool_name": "web_search",
            "tool_args": {},
            "created_at": 1.0
        }));
        tracker.upsert_raw(&json!({
            "tool_call_id": "call-1",
            "tool_args": { "q": "x" },
            "created_at": 2.0
        }));
        let tools = tracker.into_sorted();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].arguments.get("q"), Some(&json!("x")));
        // first record owns identity and creation time
        assert_eq!(tools[0].created_at, 1.0);
        assert_eq!(tools[0].name, "web_search");
    }

    #[test]
    fn merge_keeps_existing_values_when_newer_record_omits_them() {
        let mut tool = ToolInvocation::from_value(&json!({
            "tool_call_id": "call-2",
            "tool_name": "web_search",
            "tool_args": { "q": "rust" },
            "content": "ten results",
            "tool_call_error": true,
            "created_at": 5.0
        }))
        .unwrap();
        tool.merge_value(&json!({ "tool_call_id": "call-2" }));
        assert_eq!(tool.arguments.get("q"), Some(&json!("rust")));
        assert_eq!(tool.result, Some(json!("ten results")));
        assert!(tool.failed);
    }

    #[test]
    fn explicit_error_flag_overrides_in_either_direction() {
        let mut tool =
            ToolInvocation::from_value(&json!({ "tool_call_id": "c", "tool_name": "t" })).unwrap();
        tool.merge_value(&json!({ "tool_call_error": true }));
        assert!(tool.failed);
        tool.merge_value(&json!({ "tool_call_error": false }));
        assert!(!tool.failed);
    }

    #[test]
    fn into_sorted_orders_by_creation_time() {
        let mut tracker = ToolTracker::default();
        for (id, at) in [("b", 30.0), ("a", 10.0), ("c", 20.0)] {
            tracker.upsert_raw(&json!({
                "tool_call_id": id,
                "tool_name": "t",
                "created_at": at
            }));
        }
        let order: Vec<_> = tracker.into_sorted().into_iter().map(|t| t.id).collect();
        assert_eq!(order, ["a", "c", "b"]);
    }

    #[test]
    fn non_object_payloads_are_ignored() {
        let mut tracker = ToolTracker::default();
        tracker.upsert_raw(&json!("not a tool"));
        assert!(tracker.into_sorted().is_empty());
    }
}
