use std::io::Write as _;

use copychat_client::{ChatMessage, Role, ToolInvocation, content_to_text};

/// Prints the part of the accumulated answer not shown yet.
///
/// `printed` tracks how many bytes are already on screen. When the
/// accumulator replaced its text wholesale (terminal override, structured
/// payload) the old offset may no longer be a char boundary; the text is then
/// reprinted on its own line.
pub fn print_increment(text: &str, printed: &mut usize) {
    if text.len() <= *printed {
        return;
    }
    match text.get(*printed..) {
        Some(suffix) => print!("{suffix}"),
        None => print!("\n{text}"),
    }
    *printed = text.len();
    let _ = std::io::stdout().flush();
}

pub fn print_transcript(messages: &[ChatMessage]) {
    for message in messages {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "agent",
        };
        println!("{speaker}> {}", message.content);
        print_tools(&message.tool_calls);
    }
}

pub fn print_tools(tools: &[ToolInvocation]) {
    if tools.is_empty() {
        return;
    }
    println!("tools used:");
    for tool in tools {
        let marker = if tool.failed { " [failed]" } else { "" };
        println!("  - {}{marker}", tool.name);
        if !tool.arguments.is_empty() {
            let args = serde_json::to_string_pretty(&tool.arguments).unwrap_or_default();
            for line in args.lines() {
                println!("      {line}");
            }
        }
        if let Some(result) = &tool.result {
            println!("      -> {}", snippet(&content_to_text(result), 200));
        }
        if let Some(stamp) = format_timestamp(tool.created_at) {
            println!("      at {stamp}");
        }
    }
}

/// Renders an epoch-seconds timestamp, skipping the zero placeholder.
pub fn format_timestamp(secs: f64) -> Option<String> {
    if secs <= 0.0 {
        return None;
    }
    let stamp = chrono::DateTime::<chrono::Utc>::from_timestamp(secs as i64, 0)?;
    Some(stamp.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_skips_the_zero_placeholder() {
        assert!(format_timestamp(0.0).is_none());
        assert_eq!(
            format_timestamp(1_700_000_000.0).as_deref(),
            Some("2023-11-14 22:13:20")
        );
    }

    #[test]
    fn snippet_flattens_and_truncates() {
        assert_eq!(snippet("a  b\nc", 10), "a b c");
        let long = "word ".repeat(100);
        assert_eq!(snippet(&long, 20).chars().count(), 21);
    }
}
