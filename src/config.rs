//! Compiler configuration.
//!
//! Template syntax markers. The defaults are the usual `v-` / `@` / `{{ }}`
//! markers; everything else about compilation is fixed.

/// Markers the template compiler recognizes.
///
/// # Example
///
/// ```ignore
/// use vbind::CompilerConfig;
///
/// // Keep `{{ }}` free for a server-side template engine.
/// let config = CompilerConfig::default().with_delimiters("[[", "]]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Attribute prefix for directives (`v-text`, `v-on:click`, ...).
    pub directive_prefix: String,
    /// Attribute prefix for the event shorthand (`@click`).
    pub event_prefix: String,
    /// Opening interpolation delimiter.
    pub open_delimiter: String,
    /// Closing interpolation delimiter.
    pub close_delimiter: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            directive_prefix: "v-".to_string(),
            event_prefix: "@".to_string(),
            open_delimiter: "{{".to_string(),
            close_delimiter: "}}".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Replace the interpolation delimiters.
    ///
    /// Empty delimiters are ignored and the current ones are kept.
    pub fn with_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        let (open, close) = (open.into(), close.into());
        if !open.is_empty() && !close.is_empty() {
            self.open_delimiter = open;
            self.close_delimiter = close;
        }
        self
    }

    /// Replace the directive attribute prefix.
    pub fn with_directive_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.directive_prefix = prefix;
        }
        self
    }

    /// Replace the event shorthand prefix.
    pub fn with_event_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.event_prefix = prefix;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.directive_prefix, "v-");
        assert_eq!(config.event_prefix, "@");
        assert_eq!(config.open_delimiter, "{{");
        assert_eq!(config.close_delimiter, "}}");
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = CompilerConfig::default()
            .with_delimiters("", "]]")
            .with_directive_prefix("")
            .with_event_prefix("");
        assert_eq!(config, CompilerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = CompilerConfig::default()
            .with_delimiters("[[", "]]")
            .with_directive_prefix("x-")
            .with_event_prefix("on:");
        assert_eq!(config.open_delimiter, "[[");
        assert_eq!(config.close_delimiter, "]]");
        assert_eq!(config.directive_prefix, "x-");
        assert_eq!(config.event_prefix, "on:");
    }
}
