use std::sync::OnceLock;

use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_not_alnum, r"[^A-Z0-9]");
re!(re_identifier, r"[A-Z]{5}[0-9]{4}[A-Z]");

/// Label words printed on the card that OCR picks up alongside the name.
const NAME_BOILERPLATE: &[&str] = &[
    "name",
    "father's",
    "parent's",
    "signature",
    "identity",
    "card",
    "permanent",
    "account",
    "number",
    "govt",
    "india",
];

/// A name shorter than this is treated as noise.
pub const MIN_NAME_LEN: usize = 3;

/// Find the identifier in raw OCR text.
///
/// The text is uppercased and stripped of everything but `A-Z0-9`, then the
/// leftmost `AAAAA9999A` run is returned.
pub fn validate_identifier(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let clean = re_not_alnum().replace_all(&upper, "");
    re_identifier().find(&clean).map(|m| m.as_str().to_string())
}

/// Remove card boilerplate words from raw OCR name text.
///
/// Comparison ignores case and trailing `.`, `:` and `,`; surviving words keep
/// their original spelling. Lines are joined with single spaces.
pub fn normalize_name(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.split_whitespace()
                .filter(|word| !is_boilerplate(word))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_boilerplate(word: &str) -> bool {
    // Only trailing punctuation is stripped; a leading `:` keeps the word.
    let key = word.trim_end_matches(['.', ':', ',']).to_lowercase();
    NAME_BOILERPLATE.contains(&key.as_str())
}

/// Whether a normalized name is long enough to be accepted.
pub fn is_plausible_name(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_LEN
}
