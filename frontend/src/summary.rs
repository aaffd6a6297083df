use copychat_client::content_to_text;
use serde_json::Value;

/// Finds the first user message across a session's raw run records, using
/// the same precedence the reconstructor applies to the user side.
pub fn first_user_text(records: &[Value]) -> Option<String> {
    for record in records {
        let Some(entry) = record.as_object() else {
            continue;
        };
        if let Some(input) = entry.get("run_input") {
            let text = content_to_text(input);
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
        if let Some(message) = entry.get("message") {
            let text = match message.as_object() {
                Some(msg) => msg
                    .get("content")
                    .or_else(|| msg.get("text"))
                    .map(content_to_text)
                    .unwrap_or_default(),
                None => content_to_text(message),
            };
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
        if let Some(input) = entry.get("input") {
            let text = content_to_text(input);
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
    }
    None
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "of", "to", "in", "on", "for", "and", "or", "is", "are", "with", "that",
    "about",
];

/// Short label for a session, derived from its first user message.
///
/// Whitespace is collapsed; short text passes through. Otherwise the first
/// sentence is used when it fits, else the most meaningful words are kept
/// within the limit and suffixed with an ellipsis.
pub fn summarize(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "session".to_string();
    }
    if collapsed.chars().count() <= max_len {
        return collapsed;
    }

    let trimmed = collapsed.trim_end_matches(['.', ',', '!', '?', ';', ':']);
    if let Some(first_sentence) = trimmed.split('.').next() {
        let first_sentence = first_sentence.trim();
        if !first_sentence.is_empty() && first_sentence.chars().count() <= max_len {
            return first_sentence.to_string();
        }
    }

    let words: Vec<&str> = trimmed.split(' ').collect();
    let mut important: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| {
            let lower = word.to_lowercase();
            word.chars().count() > 2 && !STOP_WORDS.contains(&lower.as_str())
        })
        .collect();
    if important.is_empty() {
        important = words.iter().copied().take(5).collect();
    }

    let limit = max_len.saturating_sub(3);
    let mut label = String::new();
    for word in important {
        let sep = usize::from(!label.is_empty());
        if label.chars().count() + sep + word.chars().count() > limit {
            break;
        }
        if !label.is_empty() {
            label.push(' ');
        }
        label.push_str(word);
    }
    if !label.is_empty() {
        return format!("{label}...");
    }

    // nothing meaningful fit whole; cut at a word boundary
    let mut cut = String::new();
    for word in &words {
        if cut.chars().count() + word.chars().count() + 1 > limit {
            break;
        }
        if !cut.is_empty() {
            cut.push(' ');
        }
        cut.push_str(word);
    }
    if cut.is_empty() {
        cut = collapsed.chars().take(limit).collect();
    }
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_text_passes_through_collapsed() {
        assert_eq!(summarize("launch   plan", 30), "launch plan");
        assert_eq!(summarize("   ", 30), "session");
    }

    #[test]
    fn first_sentence_wins_when_it_fits() {
        let text = "Write me a hook. Then a caption for the course launch with details.";
        assert_eq!(summarize(text, 30), "Write me a hook");
    }

    #[test]
    fn long_text_keeps_meaningful_words_within_the_limit() {
        let text =
            "please write an engaging instagram caption about the launch of the marketing course";
        let label = summarize(text, 30);
        assert!(label.ends_with("..."));
        assert!(label.chars().count() <= 30);
        assert!(!label.contains(" the "));
    }

    #[test]
    fn first_user_text_follows_the_precedence_chain() {
        let records = vec![
            json!({ "run_input": "" }),
            json!({ "message": { "text": "from message" }, "input": "ignored" }),
        ];
        assert_eq!(first_user_text(&records).as_deref(), Some("from message"));
        assert!(first_user_text(&[json!({ "run_output": "only" })]).is_none());
    }
}
