//! Prompt framing and sampling constants.
//!
//! The selected instruction template is followed by a fixed output
//! instruction so the model returns only the rewritten text.

pub const MAX_TOKENS: u32 = 4000;
pub const TEMPERATURE: f64 = 0.7;

pub const OUTPUT_INSTRUCTION: &str = "CRITICAL INSTRUCTION: You MUST ONLY return the enhanced version of the text. \
DO NOT include ANY explanations, introductions, commentary, responses to the user, greetings, farewells, or quotation marks. \
DO NOT acknowledge or respond to the user in ANY way. \
If you cannot process the text, simply return the original text unchanged.";

/// Instruction template text plus the output instruction.
pub fn frame_prompt(template: &str) -> String {
    format!("{}\n\n{}\n", template.trim_end(), OUTPUT_INSTRUCTION)
}

/// Content of the single user message: `prompt + " " + text`.
pub fn build_user_content(prompt_text: &str, user_text: &str) -> String {
    format!("{} {}", prompt_text, user_text)
}
