//! Error types for QDL operations.

use std::fmt::{self, Write};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid filter value for {key}: {value:?}")]
    InvalidFilterValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A parse failure with the position where the expectation was not met.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    /// What the parser expected to find.
    pub message: String,
    /// Byte offset into the source text.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl SyntaxError {
    /// Build an error for `offset` in `source`, resolving line and column.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    /// Render the offending source line with a caret under the error column.
    pub fn excerpt<'a>(&self, source: &'a str) -> Excerpt<'a> {
        let line_text = source.lines().nth(self.line.saturating_sub(1)).unwrap_or("");
        Excerpt {
            line_text,
            column: self.column,
        }
    }
}

/// Two-line source excerpt produced by [`SyntaxError::excerpt`].
#[derive(Debug, Clone, Copy)]
pub struct Excerpt<'a> {
    line_text: &'a str,
    column: usize,
}

impl fmt::Display for Excerpt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.line_text)?;
        // Tabs are echoed so the caret lines up however the terminal expands them.
        for c in self.line_text.chars().take(self.column.saturating_sub(1)) {
            f.write_char(if c == '\t' { '\t' } else { ' ' })?;
        }
        f.write_char('^')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let err = SyntaxError::at("test (id 1)", 9, "expected ':' in filter");
        assert_eq!(err.offset, 9);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 10);
        assert_eq!(err.to_string(), "expected ':' in filter at line 1, column 10");
    }

    #[test]
    fn test_position_after_newline() {
        let src = "user {\n  name,\n  ?";
        let offset = src.find('?').unwrap();
        let err = SyntaxError::at(src, offset, "expected field name");
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_position_clamped_to_end() {
        let err = SyntaxError::at("test (", 100, "expected ')'");
        assert_eq!(err.offset, 6);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_excerpt_caret() {
        let src = "test { foo";
        let err = SyntaxError::at(src, src.len(), "expected '}'");
        assert_eq!(err.excerpt(src).to_string(), "test { foo\n          ^");
    }

    #[test]
    fn test_excerpt_caret_after_tabs() {
        let src = "user {\n\t\tname\n\t\t?";
        let err = SyntaxError::at(src, src.len() - 1, "expected field name");
        assert_eq!(err.column, 3);
        assert_eq!(err.excerpt(src).to_string(), "\t\t?\n\t\t^");
    }

    #[test]
    fn test_excerpt_handles_hand_built_error() {
        let err = SyntaxError {
            message: "custom".to_string(),
            offset: 0,
            line: 0,
            column: 0,
        };
        assert_eq!(err.excerpt("test").to_string(), "test\n^");
    }

    #[test]
    fn test_error_wraps_syntax() {
        let err: Error = SyntaxError::at("", 0, "expected object type identifier").into();
        assert!(matches!(err, Error::Syntax(_)));
        assert!(err.to_string().starts_with("Syntax error: expected object type identifier"));
    }
}
