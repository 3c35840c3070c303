// src/utils/html.rs

/// Sanitizes instructor-supplied question text with a whitelist (ammonia).
///
/// Safe inline markup such as <b> survives; <script>, <iframe> and event
/// attributes are removed. Options and answers are not passed through here:
/// answers are matched against option text and must stay byte-for-byte.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
