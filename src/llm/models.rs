//! Model-name normalisation.
//!
//! Users type model names loosely ("gpt4", "claude 3"). These heuristics map
//! the common variants to canonical ids. This is not validation: anything
//! unrecognised is sent as typed and may be rejected server-side.

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

pub fn normalize_openai(requested: &str) -> String {
    let lower = requested.to_lowercase();
    if lower == "gpt4" || lower == "gpt-4o" {
        return OPENAI_DEFAULT_MODEL.to_string();
    }
    if lower.contains("gpt3.5") {
        return "gpt-3.5-turbo".to_string();
    }
    requested.to_string()
}

pub fn normalize_anthropic(requested: &str) -> String {
    let lower = requested.to_lowercase();
    if lower.contains("claude-2") {
        return "claude-2".to_string();
    }
    if lower.contains("1.3") {
        return "claude-1.3".to_string();
    }
    // A bare "3" (e.g. "claude3") without a versioned id
    if lower.contains('3') && !lower.contains('-') {
        return ANTHROPIC_DEFAULT_MODEL.to_string();
    }
    requested.to_string()
}
