use copychat_client::{AgentInfo, ChatMessage, Role, RunReply, SessionInfo};

/// Session-scoped chat state, passed explicitly to every operation.
pub struct ChatContext {
    /// The agent this chat talks to.
    pub agent: AgentInfo,
    /// Current session id; `None` until the server creates one.
    pub session_id: Option<String>,
    /// Accumulated conversation, newest last.
    pub messages: Vec<ChatMessage>,
    /// The session listing last shown, so `/open n` and `/delete n` can
    /// refer to it by index.
    pub sessions: Vec<SessionInfo>,
}

impl ChatContext {
    pub fn new(agent: AgentInfo) -> Self {
        Self {
            agent,
            session_id: None,
            messages: Vec::new(),
            sessions: Vec::new(),
        }
    }

    /// Starts over with a fresh (server-assigned) session.
    pub fn reset(&mut self) {
        self.session_id = None;
        self.messages.clear();
    }

    /// Replaces the conversation with a replayed session.
    pub fn adopt_session(&mut self, session_id: String, messages: Vec<ChatMessage>) {
        self.session_id = Some(session_id);
        self.messages = messages;
    }

    pub fn push_user(&mut self, text: &str) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
            created_at: now_secs(),
            tool_calls: Vec::new(),
        });
    }

    pub fn push_assistant(&mut self, reply: &RunReply) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: reply.text.clone(),
            created_at: now_secs(),
            tool_calls: reply.tools.clone(),
        });
        if let Some(id) = &reply.session_id {
            self.session_id = Some(id.clone());
        }
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AgentInfo {
        AgentInfo {
            id: "a-1".into(),
            name: "Copywriter".into(),
            db_id: None,
        }
    }

    #[test]
    fn assistant_reply_adopts_the_server_session_id() {
        let mut ctx = ChatContext::new(agent());
        ctx.push_user("hi");
        ctx.push_assistant(&RunReply {
            text: "hello".into(),
            tools: Vec::new(),
            session_id: Some("s-1".into()),
        });
        assert_eq!(ctx.session_id.as_deref(), Some("s-1"));
        assert_eq!(ctx.messages.len(), 2);
        assert_eq!(ctx.messages[0].role, Role::User);
    }

    #[test]
    fn reset_clears_session_but_keeps_the_agent() {
        let mut ctx = ChatContext::new(agent());
        ctx.adopt_session("s-2".into(), Vec::new());
        ctx.push_user("hi");
        ctx.reset();
        assert!(ctx.session_id.is_none());
        assert!(ctx.messages.is_empty());
        assert_eq!(ctx.agent.id, "a-1");
    }
}
