//! System prompts sent to the classifier provider

pub mod classifier_prompt;

/// Builds the classifier system prompt
///
/// # Examples
///
/// ```
/// use vypar::prompts::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("'category', 'intent', and 'data'"));
/// ```
pub fn build_system_prompt() -> String {
    classifier_prompt::generate_classifier_prompt()
}
