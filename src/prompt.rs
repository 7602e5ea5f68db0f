//! Turn Builder: picks the prompt sent with each captured frame.
//!
//! Three-way contract: a user-supplied question wins outright; otherwise the
//! first analysis of a session gets the full "what am I looking at" template
//! and every later one gets the follow-up template.

/// Sent when nothing has been analyzed yet.
pub const FIRST_LOOK_PROMPT: &str = "Look at this image and tell me what food or ingredients \
you see. If it looks like I'm cooking something, provide helpful step-by-step cooking \
instructions. If you see ingredients, suggest what I could make with them. Keep your response \
concise and practical - remember it will be read aloud.";

/// Sent once at least one exchange has completed.
pub const CONTINUATION_PROMPT: &str = "Continue providing cooking guidance based on what you \
see now. Has anything changed? What should I do next? Keep it concise.";

/// Select the prompt for the next dispatch. Pure function of its inputs.
///
/// A non-empty `user_override` is returned verbatim and skips template
/// selection entirely.
pub fn select_prompt(history_is_empty: bool, user_override: Option<&str>) -> &str {
    if let Some(message) = user_override {
        if !message.trim().is_empty() {
            return message;
        }
    }
    if history_is_empty {
        FIRST_LOOK_PROMPT
    } else {
        CONTINUATION_PROMPT
    }
}
