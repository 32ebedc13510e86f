//! Shared proptest strategies for unit tests.

use proptest::prelude::*;
use proptest::string::string_regex;

/// Strategy for text without markup, control characters or protocol syntax.
///
/// Values start with a letter, never end in whitespace and are between
/// `min` and `max` characters long, so they pass `Text` rules with those
/// bounds both before and after sanitizing.
pub fn arb_plain_text(min: usize, max: usize) -> BoxedStrategy<String> {
    let min = min.max(1);
    let max = max.max(min);
    let pattern = match (min, max) {
        (_, 1) => "[A-Za-z]".to_string(),
        (1, max) => format!("[A-Za-z]([A-Za-z0-9 .,'-]{{0,{}}}[A-Za-z0-9])?", max - 2),
        (min, max) => format!(
            "[A-Za-z][A-Za-z0-9 .,'-]{{{},{}}}[A-Za-z0-9]",
            min - 2,
            max - 2
        ),
    };
    string_regex(&pattern)
        .expect("plain text pattern compiles")
        .boxed()
}

/// Strategy for well-formed email addresses.
pub fn arb_email() -> BoxedStrategy<String> {
    string_regex("[a-z][a-z0-9._+-]{0,30}@[a-z][a-z0-9-]{0,20}[a-z0-9]\\.[a-z]{2,8}")
        .expect("email pattern compiles")
        .boxed()
}

/// Strategy for text mixed with tags, scripts, handlers and stray brackets.
pub fn arb_markup_text() -> BoxedStrategy<String> {
    let segment = prop_oneof![
        "[A-Za-z0-9 ]{1,12}",
        Just("<b>".to_string()),
        Just("</b>".to_string()),
        Just("<script>alert(1)</script>".to_string()),
        Just("<SCRIPT src=x>".to_string()),
        Just("<img src=x onerror=alert(1)>".to_string()),
        Just(" onclick = steal()".to_string()),
        Just("javascript:".to_string()),
        Just("vbscript :".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        "[a-z<>/=: ]{0,10}",
    ];
    prop::collection::vec(segment, 0..8)
        .prop_map(|segments| segments.concat())
        .boxed()
}
