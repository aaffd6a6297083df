use serde_json::Value;

/// One agent the API serves.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    /// Database the agent persists sessions in; forwarded on session calls
    /// when known.
    pub db_id: Option<String>,
}

impl AgentInfo {
    /// Resolves an agent record; id lives under `id`, `agent_id`, or `_id`
    /// depending on the API version, the display name under `name` or
    /// `agent_name` (falling back to the id).
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let id = ["id", "agent_id", "_id"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))?
            .to_string();
        let name = ["name", "agent_name"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .map(str::to_owned)
            .unwrap_or_else(|| id.clone());
        let db_id = obj
            .get("db_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        Some(Self { id, name, db_id })
    }
}

/// One persisted session, as listed by the API.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionInfo {
    pub session_id: String,
    /// Seconds since epoch; zero when the API omits it.
    pub created_at: f64,
}

impl SessionInfo {
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let session_id = obj
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?
            .to_string();
        let created_at = obj.get("created_at").and_then(Value::as_f64).unwrap_or(0.0);
        Some(Self {
            session_id,
            created_at,
        })
    }
}
