// src/quiz/reconcile.rs

//! Maps stored answers and selected options onto canonical letters (A-D).
//!
//! A stored answer is either a bare letter or free text that should match one
//! of the four options. Option text may already carry its own label
//! (`"A. Paris"`), so correctness is always decided on letters, never on text.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::OPTION_COUNT;

pub const NOT_ANSWERED: &str = "Not answered";

/// An answer that spells out its own label, e.g. "C. Rome" or "b) London".
static LABELLED_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-d])\s*[.):]\s*(.+)$").expect("static regex"));

/// A letter on its own, optionally followed by its label mark: "d", "A.", "b)".
static BARE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-d])\s*[.):]?$").expect("static regex"));

/// `0 -> 'A'`, ..., `3 -> 'D'`.
pub fn letter_for_index(index: usize) -> Option<char> {
    if index >= OPTION_COUNT {
        return None;
    }
    char::from_u32('A' as u32 + index as u32)
}

/// `'A' -> 0`, ..., `'D' -> 3`.
pub fn index_for_letter(letter: char) -> Option<usize> {
    let index = (letter as u32).checked_sub('A' as u32)? as usize;
    (index < OPTION_COUNT).then_some(index)
}

/// Strips a leading `"<Letter>."` label matching `index` from an option.
pub fn strip_label(option: &str, index: usize) -> &str {
    let trimmed = option.trim();
    let Some(letter) = letter_for_index(index) else {
        return trimmed;
    };
    trimmed
        .strip_prefix(letter)
        .and_then(|rest| rest.strip_prefix('.'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Resolves the stored `answer` of a question to its canonical letter.
///
/// Option matching always wins over guessing from characters: a leading
/// letter is only trusted when it is the whole answer, or when it labels text
/// that actually matches the option it names. Returns `None` when the answer
/// cannot be tied to any option.
pub fn resolve_answer_letter(options: &[String], answer: &str) -> Option<char> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }

    if let Some(captures) = BARE_LETTER.captures(answer) {
        return captures[1].chars().next().map(|c| c.to_ascii_uppercase());
    }

    if let Some(index) = match_option(options, answer) {
        return letter_for_index(index);
    }

    let captures = LABELLED_ANSWER.captures(answer)?;
    let letter = captures[1].chars().next()?.to_ascii_uppercase();
    let index = index_for_letter(letter)?;
    let rest = captures[2].trim();
    let option = options.get(index)?;
    if option_matches(option, index, rest) || option.contains(rest) {
        return Some(letter);
    }

    None
}

/// Letter for a selected option index, `None` when nothing (or nothing valid) was selected.
pub fn selected_letter(options: &[String], selected: Option<usize>) -> Option<char> {
    selected
        .filter(|&index| index < options.len())
        .and_then(letter_for_index)
}

/// A selection is correct only when both sides resolve to the same letter.
pub fn is_correct(selected: Option<char>, correct: Option<char>) -> bool {
    matches!((selected, correct), (Some(s), Some(c)) if s == c)
}

/// Renders an option with its canonical label, e.g. `"A. Paris"`.
pub fn render_option(options: &[String], index: usize) -> Option<String> {
    let letter = letter_for_index(index)?;
    let option = options.get(index)?;
    Some(format!("{}. {}", letter, strip_label(option, index)))
}

/// Display text for an answer given its letter and, as a fallback, its raw value.
pub fn display_answer(options: &[String], letter: Option<char>, raw: Option<&str>) -> String {
    if let Some(rendered) = letter
        .and_then(index_for_letter)
        .and_then(|index| render_option(options, index))
    {
        return rendered;
    }

    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => format!("Option {}", raw),
        None => NOT_ANSWERED.to_string(),
    }
}

fn option_matches(option: &str, index: usize, text: &str) -> bool {
    option.trim() == text || strip_label(option, index) == text
}

fn match_option(options: &[String], text: &str) -> Option<usize> {
    options
        .iter()
        .enumerate()
        .find(|(index, option)| option_matches(option, *index, text))
        .or_else(|| {
            options
                .iter()
                .enumerate()
                .find(|(_, option)| option.contains(text))
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: [&str; 4]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bare_letter_round_trips() {
        let options = opts(["Paris", "London", "Rome", "Berlin"]);
        for letter in ['A', 'B', 'C', 'D'] {
            assert_eq!(
                resolve_answer_letter(&options, &letter.to_string()),
                Some(letter)
            );
        }
    }

    #[test]
    fn test_lowercase_letter_is_not_matched_as_text() {
        let options = opts(["Paris", "London", "Rome", "Berlin"]);
        assert_eq!(resolve_answer_letter(&options, "d"), Some('D'));
        assert_eq!(resolve_answer_letter(&options, "c"), Some('C'));
        assert_eq!(resolve_answer_letter(&options, " a "), Some('A'));
    }

    #[test]
    fn test_bare_label_resolves_to_its_letter() {
        let options = opts(["Paris", "London", "Rome", "Berlin"]);
        assert_eq!(resolve_answer_letter(&options, "A."), Some('A'));
        assert_eq!(resolve_answer_letter(&options, "b)"), Some('B'));
        assert_eq!(resolve_answer_letter(&options, "D :"), Some('D'));
        assert_eq!(resolve_answer_letter(&options, "E."), None);
    }

    #[test]
    fn test_full_text_answer_matches_labelled_option() {
        let options = opts(["A. Paris", "B. London", "C. Rome", "D. Berlin"]);
        let letter = resolve_answer_letter(&options, "Paris");
        assert_eq!(letter, Some('A'));
        assert_eq!(display_answer(&options, letter, Some("Paris")), "A. Paris");
    }

    #[test]
    fn test_substring_match() {
        let options = opts([
            "The mitochondria",
            "The nucleus",
            "The ribosome",
            "The cell wall",
        ]);
        assert_eq!(resolve_answer_letter(&options, "ribosome"), Some('C'));
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        let options = opts(["Rome and Paris", "Paris", "Rome", "Berlin"]);
        assert_eq!(resolve_answer_letter(&options, "Paris"), Some('B'));
    }

    #[test]
    fn test_leading_letter_is_not_guessed() {
        let options = opts(["Paris", "London", "Rome", "Madrid"]);
        assert_eq!(resolve_answer_letter(&options, "Brussels"), None);
        assert_eq!(resolve_answer_letter(&options, "Dublin"), None);
    }

    #[test]
    fn test_labelled_answer_is_validated_against_its_option() {
        let options = opts(["Paris", "London", "Rome", "Madrid"]);
        assert_eq!(resolve_answer_letter(&options, "C. Rome"), Some('C'));
        assert_eq!(resolve_answer_letter(&options, "b) London"), Some('B'));
        assert_eq!(resolve_answer_letter(&options, "C. Tokyo"), None);
    }

    #[test]
    fn test_blank_answer_is_unresolvable() {
        let options = opts(["Paris", "London", "Rome", "Madrid"]);
        assert_eq!(resolve_answer_letter(&options, "   "), None);
    }

    #[test]
    fn test_render_does_not_double_label() {
        let options = opts(["A. Paris", "B.London", "Rome", "C. Berlin"]);
        assert_eq!(render_option(&options, 0).as_deref(), Some("A. Paris"));
        assert_eq!(render_option(&options, 1).as_deref(), Some("B. London"));
        assert_eq!(render_option(&options, 2).as_deref(), Some("C. Rome"));
        // A label naming another position is part of the text.
        assert_eq!(render_option(&options, 3).as_deref(), Some("D. C. Berlin"));
        assert_eq!(render_option(&options, 4), None);
    }

    #[test]
    fn test_display_fallbacks() {
        let options = opts(["Paris", "London", "Rome", "Madrid"]);
        assert_eq!(display_answer(&options, None, Some("Tokyo")), "Option Tokyo");
        assert_eq!(display_answer(&options, None, None), NOT_ANSWERED);
        assert_eq!(display_answer(&options, None, Some("")), NOT_ANSWERED);
    }

    #[test]
    fn test_letter_comparison() {
        assert!(is_correct(Some('A'), Some('A')));
        assert!(!is_correct(Some('A'), Some('B')));
        assert!(!is_correct(None, Some('A')));
        assert!(!is_correct(None, None));
    }

    #[test]
    fn test_letter_index_mapping() {
        assert_eq!(letter_for_index(0), Some('A'));
        assert_eq!(letter_for_index(3), Some('D'));
        assert_eq!(letter_for_index(4), None);
        assert_eq!(index_for_letter('C'), Some(2));
        assert_eq!(index_for_letter('E'), None);
        assert_eq!(index_for_letter('1'), None);
    }

    #[test]
    fn test_selected_letter_ignores_out_of_range_index() {
        let options = opts(["Paris", "London", "Rome", "Madrid"]);
        assert_eq!(selected_letter(&options, Some(1)), Some('B'));
        assert_eq!(selected_letter(&options, Some(7)), None);
        assert_eq!(selected_letter(&options, None), None);
    }
}
