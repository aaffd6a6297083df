//! Common imports for typical client usage.
pub use crate::{
    AgentInfo, ApiClient, ChatMessage, ClientConfig, ClientError, ReplyAccumulator, Role, RunEvent,
    RunEventKind, RunReply, RunStream, SessionInfo, ToolInvocation, content_to_text,
    reconstruct_conversation,
};
