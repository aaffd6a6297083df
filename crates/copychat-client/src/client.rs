use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::run::{ByteStream, RunStream};
use crate::session::{AgentInfo, SessionInfo};

/// HTTP client for the agent-serving API.
///
/// Covers the control plane (agents, sessions, history, deletion) and the
/// streamed run endpoint. Transport failures surface as
/// `ClientError::Transport`, non-success statuses as `ClientError::Api` with
/// the message extracted from the response body.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Builds a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("api base_url must not be empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Builds a client from `AGENTOS_API_URL` (default `http://localhost:8000`).
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    /// The configured API base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `GET /health`; true when the API answers with a success status.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http
            .get(self.url("health"))
            .send()
            .await
            .map_err(transport_err)?;
        Ok(response.status().is_success())
    }

    /// `GET /agents`: the agents this API serves.
    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, ClientError> {
        let response = self
            .http
            .get(self.url("agents"))
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(api_error_from(response).await);
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("invalid agents payload: {e}")))?;
        Ok(list_payload(&value)
            .iter()
            .filter_map(AgentInfo::from_value)
            .collect())
    }

    /// `GET /sessions` filtered by agent (and database, when known).
    /// A 404 means no sessions yet, not a failure.
    pub async fn list_sessions(
        &self,
        agent_id: &str,
        db_id: Option<&str>,
    ) -> Result<Vec<SessionInfo>, ClientError> {
        let mut query = vec![("type", "agent"), ("component_id", agent_id)];
        if let Some(db_id) = db_id {
            query.push(("db_id", db_id));
        }
        let response = self
            .http
            .get(self.url("sessions"))
            .query(&query)
            .send()
            .await
            .map_err(transport_err)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(api_error_from(response).await);
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("invalid sessions payload: {e}")))?;
        Ok(list_payload(&value)
            .iter()
            .filter_map(SessionInfo::from_value)
            .collect())
    }

    /// `GET /sessions/{id}/runs`: raw run records for the reconstructor.
    /// A 404 means an empty history.
    pub async fn session_history(
        &self,
        session_id: &str,
        db_id: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let mut query = vec![("type", "agent")];
        if let Some(db_id) = db_id {
            query.push(("db_id", db_id));
        }
        let response = self
            .http
            .get(self.url(&format!("sessions/{session_id}/runs")))
            .query(&query)
            .send()
            .await
            .map_err(transport_err)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(api_error_from(response).await);
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("invalid history payload: {e}")))?;
        Ok(history_payload(value))
    }

    /// `DELETE /sessions/{id}`; 200 and 204 both count as success.
    pub async fn delete_session(
        &self,
        session_id: &str,
        db_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut query = vec![("type", "agent")];
        if let Some(db_id) = db_id {
            query.push(("db_id", db_id));
        }
        let response = self
            .http
            .delete(self.url(&format!("sessions/{session_id}")))
            .query(&query)
            .send()
            .await
            .map_err(transport_err)?;
        let status = response.status();
        if status == reqwest::StatusCode::OK || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(());
        }
        Err(api_error_from(response).await)
    }

    /// `POST /agents/{id}/runs` with `stream=true`; returns the lazy event
    /// stream for the run. Passing a session id continues that session,
    /// omitting it lets the server create a new one.
    pub async fn send_message(
        &self,
        agent_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<RunStream, ClientError> {
        let mut form: Vec<(&str, &str)> = vec![("message", message), ("stream", "true")];
        if let Some(session_id) = session_id {
            form.push(("session_id", session_id));
        }
        debug!(agent_id, continuing = session_id.is_some(), "starting agent run");
        let response = self
            .http
            .post(self.url(&format!("agents/{agent_id}/runs")))
            .timeout(self.config.run_timeout)
            .form(&form)
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(api_error_from(response).await);
        }
        let bytes: ByteStream = Box::pin(response.bytes_stream());
        Ok(RunStream::from_bytes(bytes))
    }
}

fn transport_err(e: reqwest::Error) -> ClientError {
    ClientError::transport(format!("request failed: {e}"))
}

async fn api_error_from(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::api(status, extract_error_message(&body))
}

/// Pulls a human-readable message out of an error body: a JSON object's
/// `detail` → `message` → `error` field, else the raw text truncated.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "unknown api error".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// List endpoints answer either a bare array or `{"data": [..]}`.
fn list_payload(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// The history endpoint additionally wraps records under `"runs"`.
fn history_payload(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            for key in ["data", "runs"] {
                if let Some(Value::Array(items)) = map.get(key)
                    && !items.is_empty()
                {
                    return items.clone();
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_base_url_is_a_config_error() {
        let err = ApiClient::new(ClientConfig::new("  ")).expect_err("empty url");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:8000/")).expect("client");
        assert_eq!(client.url("/agents"), "http://localhost:8000/agents");
        assert_eq!(
            client.url("sessions/s-1/runs"),
            "http://localhost:8000/sessions/s-1/runs"
        );
    }

    #[test]
    fn error_message_extraction_prefers_detail_then_message_then_error() {
        assert_eq!(
            extract_error_message(r#"{"detail":"d","message":"m","error":"e"}"#),
            "d"
        );
        assert_eq!(extract_error_message(r#"{"message":"m","error":"e"}"#), "m");
        assert_eq!(extract_error_message(r#"{"error":"e"}"#), "e");
    }

    #[test]
    fn error_message_extraction_falls_back_to_truncated_text() {
        assert_eq!(extract_error_message("  plain failure  "), "plain failure");
        assert_eq!(extract_error_message(""), "unknown api error");
        let long = "x".repeat(500);
        assert_eq!(extract_error_message(&long).chars().count(), 200);
    }

    #[test]
    fn list_payload_accepts_bare_arrays_and_data_wrappers() {
        assert_eq!(list_payload(&json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(list_payload(&json!({ "data": [3] })), vec![json!(3)]);
        assert!(list_payload(&json!({ "other": [] })).is_empty());
        assert!(list_payload(&json!("nope")).is_empty());
    }

    #[test]
    fn history_payload_also_accepts_runs_wrappers() {
        assert_eq!(history_payload(json!([1])), vec![json!(1)]);
        assert_eq!(history_payload(json!({ "data": [2] })), vec![json!(2)]);
        assert_eq!(history_payload(json!({ "runs": [3] })), vec![json!(3)]);
        // empty "data" falls through to "runs"
        assert_eq!(
            history_payload(json!({ "data": [], "runs": [4] })),
            vec![json!(4)]
        );
    }

    #[tokio::test]
    async fn env_gated_smoke_lists_agents_if_api_configured() {
        let Ok(url) = std::env::var("AGENTOS_API_URL") else {
            eprintln!("skipping api smoke test (AGENTOS_API_URL missing)");
            return;
        };
        let client = ApiClient::new(ClientConfig::new(url)).expect("client");
        let healthy = client.health().await.unwrap_or(false);
        if !healthy {
            eprintln!("skipping api smoke test (health probe failed)");
            return;
        }
        let agents = client.list_agents().await.expect("agents");
        assert!(!agents.is_empty(), "api reported no agents");
    }
}
