//! The parse-or-default boundary for model output.
//!
//! Models asked for JSON sometimes return fenced blocks, prose preambles, or
//! nothing parseable at all. Callers that can degrade gracefully go through
//! [`parse_or_default`], which makes the fallback path a first-class tagged
//! result instead of a caught exception with an inline literal.

use serde::de::DeserializeOwned;

/// Outcome of parsing model output that has a deterministic default.
#[derive(Debug, Clone)]
pub enum Parsed<T> {
    /// Model output parsed cleanly.
    Value(T),
    /// Model output was unusable; `value` is the deterministic default and
    /// `reason` says why it was taken.
    Fallback { value: T, reason: String },
}

impl<T> Parsed<T> {
    /// Unwraps to the carried value either way.
    pub fn into_value(self) -> T {
        match self {
            Self::Value(v) | Self::Fallback { value: v, .. } => v,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Parse `raw` as JSON `T` after stripping a markdown fence, falling back to
/// `default` with the parse error as the reason.
pub fn parse_or_default<T: DeserializeOwned>(raw: &str, default: T) -> Parsed<T> {
    let cleaned = strip_markdown_fence(raw);
    match serde_json::from_str::<T>(cleaned) {
        Ok(v) => Parsed::Value(v),
        Err(e) => Parsed::Fallback { value: default, reason: e.to_string() },
    }
}

/// Strip a markdown code-fence wrapper (```json ... ``` and variants) from
/// model output.
#[must_use]
pub fn strip_markdown_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() > 6 {
        let inner = trimmed.trim_start_matches("```").trim_end_matches("```");
        return inner.split_once('\n').map_or_else(|| inner.trim(), |(_, rest)| rest.trim());
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Digest {
        summary: String,
    }

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"summary\": \"talked about essays\"}\n```";
        assert_eq!(strip_markdown_fence(input), "{\"summary\": \"talked about essays\"}");
    }

    #[test]
    fn strips_plain_fence() {
        let input = "```\n{\"summary\": \"x\"}\n```";
        assert_eq!(strip_markdown_fence(input), "{\"summary\": \"x\"}");
    }

    #[test]
    fn leaves_bare_json_alone() {
        let input = "  {\"summary\": \"x\"}  ";
        assert_eq!(strip_markdown_fence(input), "{\"summary\": \"x\"}");
    }

    #[test]
    fn parses_fenced_value() {
        let parsed = parse_or_default::<Digest>(
            "```json\n{\"summary\": \"ok\"}\n```",
            Digest { summary: "default".to_owned() },
        );
        assert!(!parsed.is_fallback());
        assert_eq!(parsed.into_value().summary, "ok");
    }

    #[test]
    fn falls_back_with_reason_on_garbage() {
        let parsed = parse_or_default::<Digest>(
            "I'm sorry, I can't produce JSON today.",
            Digest { summary: "default".to_owned() },
        );
        match parsed {
            Parsed::Fallback { value, reason } => {
                assert_eq!(value.summary, "default");
                assert!(!reason.is_empty());
            }
            Parsed::Value(_) => panic!("expected fallback"),
        }
    }
}
