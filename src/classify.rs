// src/classify.rs

pub const ERROR_MARKER: &str = "ERROR";
pub const WARNING_MARKER: &str = "WARNING";
pub const STATUS_MARKER: &str = "Finished:";
pub const DURATION_MARKER: &str = "Total time:";

/// Which summary field a status line feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    BuildStatus,
    Duration,
}

/// Category assigned to a single log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category<'a> {
    Error,
    Warning,
    /// Status line; `value` is the trimmed text after the marker
    Status { kind: StatusKind, value: &'a str },
    Other,
}

/// Classify a line.
///
/// Precedence is fixed: Error, Warning, build status, duration, Other.
/// The Error/Warning markers are matched against the normalized text while
/// the status markers are matched against the raw line.
pub fn classify<'a>(normalized: &str, raw: &'a str) -> Category<'a> {
    if normalized.contains(ERROR_MARKER) {
        Category::Error
    } else if normalized.contains(WARNING_MARKER) {
        Category::Warning
    } else if let Some(value) = value_after(raw, STATUS_MARKER) {
        Category::Status {
            kind: StatusKind::BuildStatus,
            value,
        }
    } else if let Some(value) = value_after(raw, DURATION_MARKER) {
        Category::Status {
            kind: StatusKind::Duration,
            value,
        }
    } else {
        Category::Other
    }
}

fn value_after<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    raw.split_once(marker).map(|(_, rest)| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn classify_raw(raw: &str) -> Category<'_> {
        let key = normalize(raw);
        classify(key.as_str(), raw)
    }

    #[test]
    fn test_error_and_warning() {
        assert_eq!(classify_raw("2023-11-15 10:00:01 ERROR boom"), Category::Error);
        assert_eq!(classify_raw("[WARNING] deprecated"), Category::Warning);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(classify_raw("error: lowercase"), Category::Other);
        assert_eq!(classify_raw("Warning: mixed case"), Category::Other);
    }

    #[test]
    fn test_error_wins_over_warning_and_status() {
        assert_eq!(classify_raw("WARNING then ERROR"), Category::Error);
        assert_eq!(classify_raw("Finished: ERROR"), Category::Error);
        assert_eq!(classify_raw("Finished: WARNING"), Category::Warning);
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            classify_raw("Finished: SUCCESS"),
            Category::Status {
                kind: StatusKind::BuildStatus,
                value: "SUCCESS"
            }
        );
    }

    #[test]
    fn test_status_takes_everything_after_first_marker() {
        assert_eq!(
            classify_raw("Finished: FAILURE Finished: again  "),
            Category::Status {
                kind: StatusKind::BuildStatus,
                value: "FAILURE Finished: again"
            }
        );
    }

    #[test]
    fn test_status_wins_over_duration() {
        assert_eq!(
            classify_raw("Total time: 3 s Finished: UNSTABLE"),
            Category::Status {
                kind: StatusKind::BuildStatus,
                value: "UNSTABLE"
            }
        );
    }

    #[test]
    fn test_duration_line() {
        assert_eq!(
            classify_raw("[INFO] Total time:  01:02 min"),
            Category::Status {
                kind: StatusKind::Duration,
                value: "01:02 min"
            }
        );
    }

    #[test]
    fn test_status_checked_against_raw_text() {
        // ANSI inside the marker hides it from the normalized text but the raw
        // text is what status detection looks at.
        let raw = "Finished:\x1b[32m SUCCESS\x1b[0m";
        match classify_raw(raw) {
            Category::Status { kind, value } => {
                assert_eq!(kind, StatusKind::BuildStatus);
                assert_eq!(value, "\x1b[32m SUCCESS\x1b[0m");
            }
            other => panic!("expected status, got {:?}", other),
        }

        // A marker split by an escape sequence only exists after normalization,
        // so it is not a status line.
        assert_eq!(classify_raw("Fini\x1b[0mshed: SUCCESS"), Category::Other);
    }

    #[test]
    fn test_other() {
        assert_eq!(classify_raw("[INFO] Building module"), Category::Other);
    }
}
