use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question prompts, options and explanations are entered by admins
/// and rendered in student browsers; this whitelist-based pass keeps
/// safe formatting tags while stripping script tags and malicious
/// attributes, as a fail-safe against stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
