//! Lenient parsing of LLM memory-extraction output.
//!
//! The model is asked for a JSON array of `{type, content}` objects but
//! real responses arrive fenced, comma-dangling, or off-format. Parsing is
//! structured (JSON5) and recovers to an empty list on any structural
//! failure; it never emits partially-matched fields.

use log::warn;
use mnemo_memory::MemoryKind;
use serde::Deserialize;

/// A memory candidate extracted from one conversation exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCandidate {
    /// Candidate category.
    pub kind: MemoryKind,
    /// Candidate content.
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: String,
}

/// Parse extraction output into well-formed candidates.
///
/// Code fences are stripped; anything not bracket-delimited is treated as
/// empty. Candidates with an unrecognized type tag or blank content are
/// dropped individually.
pub fn parse_candidates(raw: &str) -> Vec<MemoryCandidate> {
    let json_text = strip_code_fence(raw.trim());
    if !(json_text.starts_with('[') && json_text.ends_with(']')) {
        if !json_text.is_empty() {
            warn!("extraction response was not a JSON array: {json_text}");
        }
        return Vec::new();
    }
    let parsed: Vec<RawCandidate> = match json5::from_str(json_text) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("failed to parse extraction response: {err}");
            return Vec::new();
        }
    };
    parsed
        .into_iter()
        .filter_map(|candidate| {
            let kind = MemoryKind::parse(&candidate.kind)?;
            if candidate.content.trim().is_empty() {
                return None;
            }
            Some(MemoryCandidate {
                kind,
                content: candidate.content,
            })
        })
        .collect()
}

/// Remove a surrounding markdown code fence, tagged or plain.
fn strip_code_fence(text: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(inner) = text
            .strip_prefix(fence)
            .and_then(|rest| rest.strip_suffix("```"))
        {
            return inner.trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{MemoryCandidate, parse_candidates};
    use mnemo_memory::MemoryKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_plain_arrays() {
        let candidates = parse_candidates(
            r#"[
                {"type": "EPISODIC", "content": "User prefers window seats"},
                {"type": "SEMANTIC", "content": "Paris is known for the Eiffel Tower"}
            ]"#,
        );
        assert_eq!(
            candidates,
            vec![
                MemoryCandidate {
                    kind: MemoryKind::Episodic,
                    content: "User prefers window seats".to_string(),
                },
                MemoryCandidate {
                    kind: MemoryKind::Semantic,
                    content: "Paris is known for the Eiffel Tower".to_string(),
                },
            ]
        );
    }

    #[test]
    fn strips_tagged_and_plain_fences() {
        let fenced = "```json\n[{\"type\": \"EPISODIC\", \"content\": \"fact\"}]\n```";
        assert_eq!(parse_candidates(fenced).len(), 1);

        let plain = "```\n[{\"type\": \"SEMANTIC\", \"content\": \"fact\"}]\n```";
        assert_eq!(parse_candidates(plain).len(), 1);
    }

    #[test]
    fn tolerates_trailing_commas() {
        let candidates = parse_candidates(
            r#"[
                {"type": "EPISODIC", "content": "User prefers aisle seats",},
            ]"#,
        );
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn non_array_output_is_empty() {
        assert_eq!(parse_candidates("Sorry, no memories found."), Vec::new());
        assert_eq!(parse_candidates(""), Vec::new());
        assert_eq!(
            parse_candidates(r#"{"type": "EPISODIC", "content": "not a list"}"#),
            Vec::new()
        );
    }

    #[test]
    fn structural_failure_recovers_to_empty() {
        assert_eq!(parse_candidates("[{\"type\": \"EPISODIC\", ...broken"), Vec::new());
        assert_eq!(parse_candidates("[1, 2, 3]"), Vec::new());
    }

    #[test]
    fn malformed_candidates_are_dropped_individually() {
        let candidates = parse_candidates(
            r#"[
                {"type": "EPISODIC", "content": "   "},
                {"type": "PROCEDURAL", "content": "not a known kind"},
                {"content": "missing type"},
                {"type": "SEMANTIC", "content": "kept"}
            ]"#,
        );
        assert_eq!(
            candidates,
            vec![MemoryCandidate {
                kind: MemoryKind::Semantic,
                content: "kept".to_string(),
            }]
        );
    }

    #[test]
    fn empty_array_yields_no_candidates() {
        assert_eq!(parse_candidates("[]"), Vec::new());
        assert_eq!(parse_candidates("```json\n[]\n```"), Vec::new());
    }
}
