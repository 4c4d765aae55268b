//! Matching for `if text …` blocks against submitted input.

/// A parsed textbox query.
///
/// Comparison is case-insensitive and trim-aware throughout. Word queries
/// (`has`, `!has`, `pick`) split their argument on commas, with `\c`
/// standing for a literal comma inside a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextQuery {
    /// Exact match.
    Is(String),
    /// Exact mismatch.
    IsNot(String),
    /// Every word must appear as a whole word.
    Has(Vec<String>),
    /// No word may appear as a whole word.
    HasNot(Vec<String>),
    /// At least one word must appear as a whole word.
    Pick(Vec<String>),
}

impl TextQuery {
    /// Parse a query from its keyword and argument. Returns `None` for an
    /// unrecognized keyword or an argument with no usable words.
    pub fn parse(kind: &str, arg: &str) -> Option<Self> {
        match kind {
            "is" => Some(TextQuery::Is(arg.trim().to_string())),
            "!is" => Some(TextQuery::IsNot(arg.trim().to_string())),
            "has" | "!has" | "pick" => {
                let words = split_words(arg);
                if words.is_empty() {
                    return None;
                }
                Some(match kind {
                    "has" => TextQuery::Has(words),
                    "!has" => TextQuery::HasNot(words),
                    _ => TextQuery::Pick(words),
                })
            }
            _ => None,
        }
    }

    /// Check submitted input against this query.
    pub fn matches(&self, input: &str) -> bool {
        match self {
            TextQuery::Is(expected) => eq_fold(input, expected),
            TextQuery::IsNot(expected) => !eq_fold(input, expected),
            TextQuery::Has(words) => words.iter().all(|w| contains_word(input, w)),
            TextQuery::HasNot(words) => !words.iter().any(|w| contains_word(input, w)),
            TextQuery::Pick(words) => words.iter().any(|w| contains_word(input, w)),
        }
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Split a query argument on commas, honoring `\c` as an escaped comma.
/// Words are trimmed; empty words are dropped.
fn split_words(arg: &str) -> Vec<String> {
    let mut words = vec![String::new()];
    let mut chars = arg.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'c') {
            chars.next();
            words.last_mut().expect("never empty").push(',');
        } else if c == ',' {
            words.push(String::new());
        } else {
            words.last_mut().expect("never empty").push(c);
        }
    }

    words
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whole-word, case-insensitive containment.
fn contains_word(input: &str, word: &str) -> bool {
    let haystack = input.to_lowercase();
    let needle = word.to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(&needle) {
        let idx = from + rel;
        let end = idx + needle.len();
        let before_ok = idx == 0 || !is_word_byte(bytes[idx - 1]);
        let after_ok = end >= bytes.len() || !is_word_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        // Step past one character, not one byte.
        from = idx
            + haystack[idx..]
                .chars()
                .next()
                .map_or(1, |c| c.len_utf8());
    }
    false
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
