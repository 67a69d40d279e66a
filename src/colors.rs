use is_terminal::IsTerminal;
use serde::Deserialize;

/// When to color the text report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when stdout is a terminal and NO_COLOR is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn use_colors(self) -> bool {
        match self {
            ColorChoice::Auto => should_use_colors(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Auto-detect color support for stdout
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// ANSI color codes for the text report
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub heading: &'static str, // Bold for section headings
    pub label: &'static str,   // Cyan for field names
    pub error: &'static str,   // Red for errors and failed builds
    pub warning: &'static str, // Yellow for warnings
    pub success: &'static str, // Green for successful builds
    pub count: &'static str,   // Magenta for occurrence counts
    pub reset: &'static str,
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                heading: "\x1b[1m",
                label: "\x1b[36m",
                error: "\x1b[31m",
                warning: "\x1b[33m",
                success: "\x1b[32m",
                count: "\x1b[35m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                heading: "",
                label: "",
                error: "",
                warning: "",
                success: "",
                count: "",
                reset: "",
            }
        }
    }

    /// Color for a build status value
    pub fn status(&self, status: &str) -> &'static str {
        match status {
            "SUCCESS" => self.success,
            "FAILURE" | "ABORTED" => self.error,
            "" => self.reset,
            _ => self.warning,
        }
    }
}
