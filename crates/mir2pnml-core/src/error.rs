//! Error types for MIR parsing.
//!
//! Mirrors the taxonomy the translation pipeline relies on: anything that
//! prevents producing a well-formed net is a hard [`ParseError`]; anything
//! that merely makes the net less precise is a [`crate::net::Warning`]
//! attached to the net instead (see [`crate::builder`]).

use std::fmt;

/// Structural parse failure: the input could not be reduced to a function
/// list at all (unbalanced braces preventing function extraction).
///
/// Never carries a partial result — see `spec.md` §7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub function: Option<String>,
    pub basic_block: Option<String>,
    pub line: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            function: None,
            basic_block: None,
            line: None,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_basic_block(mut self, basic_block: impl Into<String>) -> Self {
        self.basic_block = Some(basic_block.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(function) = &self.function {
            parts.push(format!("function {function}"));
        }
        if let Some(basic_block) = &self.basic_block {
            parts.push(format!("basic block {basic_block}"));
        }
        if let Some(line) = self.line {
            parts.push(format!("near line {line}"));
        }
        if parts.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (in {})", self.message, parts.join(" / "))
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_message_has_no_suffix() {
        let err = ParseError::new("unbalanced braces");
        assert_eq!(err.to_string(), "unbalanced braces");
    }

    #[test]
    fn full_context_is_rendered() {
        let err = ParseError::new("unbalanced braces")
            .with_function("main")
            .with_basic_block("bb0")
            .with_line(42);
        assert_eq!(
            err.to_string(),
            "unbalanced braces (in function main / basic block bb0 / near line 42)"
        );
    }
}
