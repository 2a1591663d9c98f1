//! Output rendering for engine results
//!
//! - Text output for human-readable display (with colors)
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonRenderer;
pub use text::TextRenderer;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

impl OutputFormat {
    /// Selects the format from CLI flags
    pub fn from_cli(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_format_from_cli() {
        assert_eq!(OutputFormat::from_cli(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_cli(false), OutputFormat::Text);
    }
}
