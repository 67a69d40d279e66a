// src/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Leading `YYYY-MM-DD HH:MM:SS` stamp. ASCII digits only, no zone, no fraction.
static TIMESTAMP_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\s+[0-9]{2}:[0-9]{2}:[0-9]{2}")
        .expect("timestamp pattern is valid")
});

/// ANSI CSI sequence: ESC [ <params> <letter>
static ANSI_CSI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("ansi pattern is valid"));

/// Canonical form of a log line used to decide whether two lines are the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the dedup key for a raw line.
///
/// Strips ANSI color sequences, any leading timestamp, collapses whitespace
/// runs to one space and trims both ends. Pure and idempotent:
/// `normalize(normalize(x).as_str()) == normalize(x)`.
pub fn normalize(raw: &str) -> NormalizedKey {
    let without_ansi = strip_ansi(raw);
    let body = strip_timestamps(&without_ansi);
    NormalizedKey(collapse_whitespace(body))
}

/// Remove every ANSI CSI sequence from the line.
///
/// Removal runs until nothing matches, since splicing out one sequence can
/// join an orphan ESC with a following `[..m` into a new one.
pub fn strip_ansi(raw: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(raw);
    loop {
        let next = match ANSI_CSI.replace_all(&current, "") {
            Cow::Borrowed(_) => None,
            Cow::Owned(stripped) => Some(stripped),
        };
        match next {
            Some(stripped) => current = Cow::Owned(stripped),
            None => return current,
        }
    }
}

/// Drop leading timestamps, looking past leading whitespace.
fn strip_timestamps(line: &str) -> &str {
    let mut rest = line.trim_start();
    while let Some(found) = TIMESTAMP_PREFIX.find(rest) {
        rest = rest[found.end()..].trim_start();
    }
    rest
}

fn collapse_whitespace(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for word in line.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
