//! Neutralization of markup and script payloads in free text.
//!
//! [`sanitize_text`] removes the constructs that could execute when a value is
//! later rendered as HTML:
//! - `<script>` and `<style>` blocks, including their content
//! - every tag-shaped construct and any leftover angle bracket
//! - inline event-handler prefixes such as `onerror=`, for known DOM event names
//! - script-protocol prefixes such as `javascript:`
//!
//! Everything else is kept byte-for-byte, apart from trimming leading and
//! trailing whitespace. Prose like `one = 1` is not an event handler.
//!
//! # Idempotence
//!
//! Removing one construct can splice together another one
//! (`javajavascript:script:` becomes `javascript:`). Angle brackets are all
//! gone after the first pass, and handler and protocol prefixes are stripped
//! with a single stack-like scan that also catches spliced prefixes, so the
//! text reaches a fixed point in linear time. The passes still repeat until
//! nothing changes, which makes `sanitize_text(sanitize_text(x)) == sanitize_text(x)`
//! hold for every input.

use std::sync::LazyLock;

use regex::Regex;

use crate::state::FormValues;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("static pattern compiles")
});

static UNTERMINATED_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*$").expect("static pattern compiles")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[a-zA-Z/!?][^>]*>").expect("static pattern compiles")
});

/// DOM event attributes, lowercase.
const EVENT_NAMES: &[&str] = &[
    "onabort", "onafterprint", "onbeforeprint", "onbeforeunload", "onbegin", "onblur",
    "oncanplay", "oncanplaythrough", "onchange", "onclick", "oncontextmenu", "oncopy", "oncut",
    "ondblclick", "ondrop", "ondurationchange", "onend", "onended", "onerror", "onfocus",
    "onfocusin", "onfocusout", "onhashchange", "oninput", "oninvalid", "onload", "onloadeddata",
    "onloadedmetadata", "onloadstart", "onmessage", "onoffline", "ononline", "onpagehide",
    "onpageshow", "onpaste", "onpause", "onplay", "onplaying", "onpopstate", "onprogress",
    "onratechange", "onrepeat", "onreset", "onresize", "onscroll", "onsearch", "onseeked",
    "onseeking", "onselect", "onshow", "onstalled", "onstorage", "onsubmit", "onsuspend",
    "ontimeupdate", "ontoggle", "onunload", "onvolumechange", "onwaiting", "onwheel",
];

/// Event attribute families, matched by prefix (`onmouseover`, `onkeydown`, ...).
const EVENT_PREFIXES: &[&str] = &[
    "onanimation", "ondrag", "onkey", "onmouse", "onpointer", "ontouch", "ontransition",
];

const MAX_EVENT_NAME_LEN: usize = 32;

const SCRIPT_SCHEMES: [&str; 3] = ["java", "vb", "live"];

/// Returns a copy of `input` with markup and script payloads removed.
///
/// # Examples
///
/// ```
/// use secure_form::sanitize_text;
///
/// assert_eq!(sanitize_text("<script>alert(1)</script>hello"), "hello");
/// assert_eq!(sanitize_text("  <b>Name</b>  "), "Name");
/// assert_eq!(sanitize_text("Café, 10% off!"), "Café, 10% off!");
/// ```
pub fn sanitize_text(input: &str) -> String {
    let mut current = clean_once(input);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input, "");
    let text = UNTERMINATED_SCRIPT.replace_all(&text, "");
    let text = TAG.replace_all(&text, "");
    let text = text.replace(['<', '>'], "");
    strip_inline_vectors(&text).trim().to_string()
}

/// Drops event-handler and script-protocol prefixes in one left-to-right scan.
///
/// Output is built as a stack: whenever a `:` or `=` lands, the tail is
/// checked for a prefix ending there and popped if one is found. A prefix
/// spliced together by an earlier removal is therefore caught as soon as its
/// last character arrives.
fn strip_inline_vectors(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        out.push(c);
        let start = match c {
            ':' => script_protocol_start(&out),
            '=' => event_handler_start(&out),
            _ => None,
        };
        if let Some(start) = start {
            out.truncate(start);
        }
    }
    out
}

/// Start of a `javascript :`-style prefix ending at the last byte of `buf`.
fn script_protocol_start(buf: &str) -> Option<usize> {
    let head = buf[..buf.len() - 1].trim_end();
    let head = strip_suffix_ignore_ascii_case(head, "script")?;
    SCRIPT_SCHEMES
        .iter()
        .find_map(|scheme| strip_suffix_ignore_ascii_case(head, scheme))
        .map(str::len)
}

/// Start of an `onerror =`-style prefix ending at the last byte of `buf`.
fn event_handler_start(buf: &str) -> Option<usize> {
    let head = buf[..buf.len() - 1].trim_end();
    let word_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .take(MAX_EVENT_NAME_LEN + 1)
        .last()
        .map(|(i, _)| i)?;

    let word = &head[word_start..];
    let at_word_boundary = head[..word_start]
        .chars()
        .next_back()
        .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));

    (word.len() <= MAX_EVENT_NAME_LEN && at_word_boundary && is_event_name(word))
        .then_some(word_start)
}

fn is_event_name(word: &str) -> bool {
    let word = word.to_ascii_lowercase();
    EVENT_NAMES.contains(&word.as_str())
        || EVENT_PREFIXES.iter().any(|prefix| word.starts_with(prefix))
}

fn strip_suffix_ignore_ascii_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) || !s[split..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    Some(&s[..split])
}

/// Sanitizes the named fields of `values`, leaving every other field as is.
///
/// Names that are not present in `values` are ignored.
pub fn sanitize_fields<S: AsRef<str>>(mut values: FormValues, fields: &[S]) -> FormValues {
    for field in fields {
        if let Some(value) = values.get_mut(field.as_ref()) {
            *value = sanitize_text(value);
        }
    }
    values
}
