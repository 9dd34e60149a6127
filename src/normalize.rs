use once_cell::sync::Lazy;
use regex::Regex;

/// How a field value is expected to read: a registry-style identifier with a
/// fixed lexical shape, or free text carrying one or more quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Identifier,
    FreeText,
}

static REF_PAIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<ref.*?>.*?</ref>").unwrap());
static REF_SELF_CLOSED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<ref[^>]*/>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static VAL_TEMPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{val\|([0-9.,]+)(?:\|.*?)?\}\}").unwrap());
static CHECKSUM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2,7}-\d{2,3}-\d)\b").unwrap());
static NON_ID_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d-]").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+\.?\d*").unwrap());

/// Strips wiki noise from a raw field value: reference tags and their
/// content, HTML comments, and the `{{val|...}}` formatting template, which
/// is unwrapped down to its leading numeric token.
pub fn clean_markup(text: &str) -> String {
    let s = REF_PAIR_RE.replace_all(text, "");
    let s = REF_SELF_CLOSED_RE.replace_all(&s, "");
    let s = COMMENT_RE.replace_all(&s, "");
    let s = VAL_TEMPLATE_RE.replace_all(&s, "$1");
    s.trim().to_string()
}

/// Normalizes a raw field value for string comparison.
///
/// Identifier kind: a checksum-style identifier (2-7 digits, 2-3 digits, one
/// check digit, hyphen-separated) is returned exactly when present; otherwise
/// everything except digits and hyphens is stripped. Free-text kind:
/// non-breaking spaces become ordinary spaces and whitespace runs collapse.
pub fn normalize_value(text: &str, kind: ValueKind) -> String {
    let s = clean_markup(text);
    match kind {
        ValueKind::Identifier => {
            if let Some(m) = CHECKSUM_ID_RE.find(&s) {
                return m.as_str().to_string();
            }
            NON_ID_CHARS_RE.replace_all(&s, "").trim().to_string()
        }
        ValueKind::FreeText => {
            let s = s.replace("&nbsp;", " ").replace('\u{a0}', " ");
            s.split_whitespace().collect::<Vec<_>>().join(" ")
        }
    }
}

/// Extracts every decimal number from a raw field value, in order of
/// appearance. Comma decimal separators are treated as dots; tokens that
/// fail to parse are skipped.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let s = normalize_value(text, ValueKind::FreeText).replace(',', ".");
    NUMBER_RE
        .find_iter(&s)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}
