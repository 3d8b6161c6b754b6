//! Text-based tool-call parser (§4.5.1).
//!
//! Small instruct-tuned models that lack native tool-call support still
//! need to invoke tools: they're asked to emit a JSON object describing
//! the call, possibly wrapped in prose or a Markdown code fence. This
//! module extracts that object, rejecting anything whose `name` isn't
//! a tool the caller actually offered (guards against hallucinated
//! tool names).

use std::collections::HashMap;

use serde_json::Value;

/// A tool call extracted from free-form assistant text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCall {
    /// The tool name, as it appeared in the mapping.
    pub name: String,
    /// The call arguments.
    pub arguments: Value,
}

/// Parse a tool call out of `text`, accepting only names present in
/// `tool_names` (typically every key of the active tool mapping built
/// in orchestrator step 2).
///
/// Returns `None` if no shape in the text names a known tool — the
/// caller should then treat `text` as the final answer.
#[must_use]
pub fn parse_tool_call(text: &str, tool_names: &std::collections::HashSet<String>) -> Option<ParsedToolCall> {
    let stripped = strip_code_fences(text);

    if let Some(call) = try_parse_candidate(stripped.trim(), tool_names) {
        return Some(call);
    }

    let mut candidates = balanced_brace_substrings(stripped);
    candidates.sort_by_key(|c| std::cmp::Reverse(c.len()));

    candidates
        .into_iter()
        .find_map(|candidate| try_parse_candidate(candidate, tool_names))
}

/// Strip a single layer of surrounding Markdown code fence
/// (` ```json ... ``` ` or plain ` ``` ... ``` `), if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
    let after_open = after_open.trim_start_matches(['\n', '\r']);
    after_open.strip_suffix("```").unwrap_or(after_open).trim()
}

/// Every substring of `text` that forms a balanced `{...}` span,
/// scanning left to right and tracking nesting depth.
fn balanced_brace_substrings(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => stack.push(i),
            b'}' => {
                if let Some(start) = stack.pop() {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

/// Check whether `candidate` parses as `{"name": "...", "parameters"|"arguments": {...}}`
/// with `name` present in `tool_names`.
fn try_parse_candidate(candidate: &str, tool_names: &std::collections::HashSet<String>) -> Option<ParsedToolCall> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let obj = value.as_object()?;

    let name = obj.get("name")?.as_str()?;
    if !tool_names.contains(name) {
        return None;
    }

    let arguments = obj
        .get("parameters")
        .or_else(|| obj.get("arguments"))?
        .as_object()?
        .clone();

    Some(ParsedToolCall {
        name: name.to_string(),
        arguments: Value::Object(arguments),
    })
}

/// Build the set of tool names a [`parse_tool_call`] call should accept,
/// from a `tool name -> server id` mapping (the shape the orchestrator
/// builds in step 2 of §4.5).
#[must_use]
pub fn tool_name_set(mapping: &HashMap<String, String>) -> std::collections::HashSet<String> {
    mapping.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn names(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn fenced_json_is_extracted() {
        let text = "```json\n{\"name\":\"gmail__search_emails\",\"parameters\":{\"query\":\"from:a@b.com\"}}\n```";
        let mapping = names(&["gmail__search_emails"]);

        let call = parse_tool_call(text, &mapping).expect("expected a tool call");
        assert_eq!(call.name, "gmail__search_emails");
        assert_eq!(call.arguments, serde_json::json!({"query": "from:a@b.com"}));
    }

    #[test]
    fn unknown_tool_name_is_rejected() {
        let text = r#"{"name":"read_email","parameters":{"messageId":"None"}}"#;
        let mapping = names(&["gmail__search_emails"]);

        assert_eq!(parse_tool_call(text, &mapping), None);
    }

    #[test]
    fn plain_prose_has_no_tool_call() {
        let text = "The weather today is sunny with a high of 75F.";
        let mapping = names(&["gmail__search_emails"]);

        assert_eq!(parse_tool_call(text, &mapping), None);
    }

    #[test]
    fn embedded_in_prose_with_prefix_and_suffix() {
        let text = "Sure, let me check that.\n{\"name\":\"gmail__search_emails\",\"arguments\":{\"query\":\"unread\"}}\nOne moment.";
        let mapping = names(&["gmail__search_emails"]);

        let call = parse_tool_call(text, &mapping).expect("expected a tool call");
        assert_eq!(call.name, "gmail__search_emails");
        assert_eq!(call.arguments, serde_json::json!({"query": "unread"}));
    }

    #[test]
    fn longest_balanced_candidate_wins_when_whole_string_fails() {
        let text = "prefix {\"ignored\": true} then {\"name\":\"gmail__search_emails\",\"parameters\":{\"query\":\"x\"}} suffix";
        let mapping = names(&["gmail__search_emails"]);

        let call = parse_tool_call(text, &mapping).expect("expected a tool call");
        assert_eq!(call.name, "gmail__search_emails");
    }

    #[test]
    fn parser_is_idempotent_under_reserialization() {
        let mapping = names(&["gmail__search_emails"]);
        let original = parse_tool_call(
            r#"{"name":"gmail__search_emails","parameters":{"query":"x"}}"#,
            &mapping,
        )
        .unwrap();

        let reserialized = serde_json::json!({
            "name": original.name,
            "parameters": original.arguments,
        })
        .to_string();

        let reparsed = parse_tool_call(&reserialized, &mapping).unwrap();
        assert_eq!(reparsed, original);
    }
}
