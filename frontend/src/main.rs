//! Terminal chat frontend for the copywriting agent API.
//!
//! Picks an agent, then runs a line-oriented chat loop. Session commands:
//! `/sessions`, `/open <n>`, `/delete <n>`, `/new`, `/quit`.

mod context;
mod render;
mod summary;

use std::io::Write as _;

use anyhow::Context as _;
use clap::Parser;
use copychat_client::prelude::*;

use crate::context::ChatContext;

#[derive(Parser, Debug)]
#[command(name = "copychat", about = "Chat with the copywriting agent")]
struct Args {
    /// Base URL of the agent API (overrides AGENTOS_API_URL)
    #[arg(long)]
    api_url: Option<String>,
    /// Agent id or name to chat with (defaults to the first agent reported)
    #[arg(long)]
    agent: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    copychat_client::init_observability();
    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config = config.base_url(url);
    }
    let client = ApiClient::new(config)?;

    if !client.health().await.unwrap_or(false) {
        eprintln!(
            "warning: no healthy api at {}; is the agent server running?",
            client.base_url()
        );
    }

    let agents = client.list_agents().await?;
    let agent = select_agent(agents, args.agent.as_deref())?;
    println!("chatting with {} ({})", agent.name, agent.id);
    println!("commands: /sessions /open <n> /delete <n> /new /quit");

    let mut ctx = ChatContext::new(agent);
    chat_loop(&client, &mut ctx).await
}

fn select_agent(agents: Vec<AgentInfo>, wanted: Option<&str>) -> anyhow::Result<AgentInfo> {
    match wanted {
        Some(id) => agents
            .into_iter()
            .find(|agent| agent.id == id || agent.name == id)
            .with_context(|| format!("agent {id} not found")),
        None => agents
            .into_iter()
            .next()
            .context("the api reported no agents"),
    }
}

async fn chat_loop(client: &ApiClient, ctx: &mut ChatContext) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            "/quit" | "/exit" => return Ok(()),
            "/new" => {
                ctx.reset();
                println!("started a new session");
            }
            "/sessions" => {
                if let Err(err) = show_sessions(client, ctx).await {
                    eprintln!("error: {err}");
                }
            }
            _ => {
                if let Some(index) = parse_indexed_command(input, "/open") {
                    if let Err(err) = open_session(client, ctx, index).await {
                        eprintln!("error: {err}");
                    }
                } else if let Some(index) = parse_indexed_command(input, "/delete") {
                    if let Err(err) = delete_session(client, ctx, index).await {
                        eprintln!("error: {err}");
                    }
                } else if input.starts_with('/') {
                    println!("unknown command: {input}");
                } else if let Err(err) = send(client, ctx, input).await {
                    // transport and provider failures are shown verbatim;
                    // whatever streamed before the failure stays on screen
                    eprintln!("error: {err}");
                }
            }
        }
    }
}

fn parse_indexed_command(input: &str, command: &str) -> Option<usize> {
    input
        .strip_prefix(command)?
        .trim()
        .parse()
        .ok()
        .filter(|&n| n > 0)
}

async fn send(client: &ApiClient, ctx: &mut ChatContext, text: &str) -> Result<(), ClientError> {
    let mut run = client
        .send_message(&ctx.agent.id, text, ctx.session_id.as_deref())
        .await?;
    ctx.push_user(text);

    let mut reply = ReplyAccumulator::default();
    let mut printed = 0usize;
    loop {
        match run.next_event().await {
            Some(Ok(event)) => {
                if let Err(err) = reply.push(&event) {
                    println!();
                    return Err(err);
                }
                render::print_increment(reply.text(), &mut printed);
            }
            Some(Err(err)) => {
                println!();
                return Err(err);
            }
            None => break,
        }
    }

    let reply = reply.finish();
    if reply.text.len() != printed {
        // the terminal event replaced the accumulated text; show it whole
        println!();
        println!("{}", reply.text);
    } else {
        println!();
    }
    render::print_tools(&reply.tools);
    ctx.push_assistant(&reply);
    Ok(())
}

async fn show_sessions(client: &ApiClient, ctx: &mut ChatContext) -> Result<(), ClientError> {
    let mut sessions = client
        .list_sessions(&ctx.agent.id, ctx.agent.db_id.as_deref())
        .await?;
    sessions.sort_by(|a, b| b.created_at.total_cmp(&a.created_at));
    if sessions.is_empty() {
        println!("no sessions yet; send a message to start one");
        ctx.sessions = sessions;
        return Ok(());
    }
    for (idx, session) in sessions.iter().enumerate() {
        let records = client
            .session_history(&session.session_id, ctx.agent.db_id.as_deref())
            .await
            .unwrap_or_default();
        let label = summary::first_user_text(&records)
            .map(|text| summary::summarize(&text, 30))
            .unwrap_or_else(|| "empty session".to_string());
        match render::format_timestamp(session.created_at) {
            Some(stamp) => println!("{:>3}) {label}  ({stamp})", idx + 1),
            None => println!("{:>3}) {label}", idx + 1),
        }
    }
    ctx.sessions = sessions;
    Ok(())
}

async fn open_session(
    client: &ApiClient,
    ctx: &mut ChatContext,
    index: usize,
) -> Result<(), ClientError> {
    let Some(info) = ctx.sessions.get(index - 1).cloned() else {
        println!("no session {index}; run /sessions first");
        return Ok(());
    };
    let records = client
        .session_history(&info.session_id, ctx.agent.db_id.as_deref())
        .await?;
    let messages = reconstruct_conversation(&records);
    tracing::debug!(
        session_id = %info.session_id,
        records = records.len(),
        messages = messages.len(),
        "replayed session history"
    );
    if messages.is_empty() {
        println!("this session has no replayable history");
    } else {
        render::print_transcript(&messages);
    }
    ctx.adopt_session(info.session_id, messages);
    Ok(())
}

async fn delete_session(
    client: &ApiClient,
    ctx: &mut ChatContext,
    index: usize,
) -> Result<(), ClientError> {
    let Some(info) = ctx.sessions.get(index - 1).cloned() else {
        println!("no session {index}; run /sessions first");
        return Ok(());
    };
    client
        .delete_session(&info.session_id, ctx.agent.db_id.as_deref())
        .await?;
    println!("deleted session {}", info.session_id);
    ctx.sessions.retain(|s| s.session_id != info.session_id);
    if ctx.session_id.as_deref() == Some(info.session_id.as_str()) {
        ctx.reset();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, name: &str) -> AgentInfo {
        AgentInfo {
            id: id.into(),
            name: name.into(),
            db_id: None,
        }
    }

    #[test]
    fn select_agent_defaults_to_the_first_one() {
        let picked = select_agent(vec![agent("a", "Alpha"), agent("b", "Beta")], None).unwrap();
        assert_eq!(picked.id, "a");
    }

    #[test]
    fn select_agent_matches_by_id_or_name() {
        let agents = vec![agent("a", "Alpha"), agent("b", "Beta")];
        assert_eq!(select_agent(agents.clone(), Some("b")).unwrap().id, "b");
        assert_eq!(select_agent(agents, Some("Alpha")).unwrap().id, "a");
        assert!(select_agent(vec![], Some("missing")).is_err());
    }

    #[test]
    fn indexed_commands_parse_positive_numbers_only() {
        assert_eq!(parse_indexed_command("/open 2", "/open"), Some(2));
        assert_eq!(parse_indexed_command("/open  7 ", "/open"), Some(7));
        assert_eq!(parse_indexed_command("/open 0", "/open"), None);
        assert_eq!(parse_indexed_command("/open x", "/open"), None);
        assert_eq!(parse_indexed_command("/delete 1", "/open"), None);
    }
}
