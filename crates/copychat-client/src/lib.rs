//! Client for the copywriting agent API.
//!
//! The API serves agents over HTTP: a run endpoint that streams concatenated
//! JSON event objects, plus session listing, history, and deletion. This
//! crate decodes the stream incrementally, accumulates the answer and tool
//! activity, and rebuilds past conversations from the loosely shaped run
//! records the history endpoint returns.
//!
//! # Usage
//!
//! ```no_run
//! use copychat_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = ApiClient::from_env()?;
//! let agents = client.list_agents().await?;
//! let agent = agents.first().expect("no agents registered");
//!
//! let run = client
//!     .send_message(&agent.id, "Draft an Instagram caption for a course launch", None)
//!     .await?;
//! let reply = run.collect().await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

/// HTTP client for the agent-serving API.
pub mod client;
/// Client configuration and environment loading.
pub mod config;
/// Public error types.
pub mod errors;
/// Conversation reconstruction from raw run records.
pub mod history;
/// Logging initialization.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Streamed run handle and reply accumulation.
pub mod run;
/// Agent and session records.
pub mod session;
/// Normalized stream events.
pub mod stream;
/// Tool invocation records and merge rules.
pub mod tools;
/// Incremental JSON frame extraction from chunked bytes.
pub(crate) mod transport;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use errors::ClientError;
pub use history::{ChatMessage, Role, content_to_text, reconstruct_conversation};
pub use observability::init_observability;
pub use run::{ReplyAccumulator, RunReply, RunStream};
pub use session::{AgentInfo, SessionInfo};
pub use stream::{RunEvent, RunEventKind};
pub use tools::ToolInvocation;
