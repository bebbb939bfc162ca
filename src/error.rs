//! Error types for module loading, parsing, and mounting.
//!
//! Every failure is fatal to the bootstrap sequence:
//!
//! - **`ModuleLoadError`**: the parser module could not be loaded or was
//!   used before it finished loading
//! - **`ParseError`**: the parser rejected its input
//! - **`TargetNotFoundError`**: the mount target is missing from the document
//!
//! `BootError` unifies the three so the bootstrap can use `?` throughout.

use thiserror::Error;

/// Result type for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootError>;

/// Top-level bootstrap failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error(transparent)]
    ModuleLoad(#[from] ModuleLoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    TargetNotFound(#[from] TargetNotFoundError),
}

/// The parser module failed to load, instantiate, or was accessed too early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleLoadError {
    /// The module artifact could not be retrieved
    #[error("failed to fetch module `{source_name}`: {reason}")]
    Fetch { source_name: String, reason: String },

    /// The module was retrieved but failed its instantiation self-check
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    /// The host environment cannot run the module
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// An export was requested before `initialize()` resolved
    #[error("module accessed before initialization completed")]
    NotInitialized,
}

/// The mount target element does not exist in the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mount target `#{target_id}` not found in document")]
pub struct TargetNotFoundError {
    pub target_id: String,
}

impl TargetNotFoundError {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
        }
    }
}

/// A parse failure at a byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at byte {offset})")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(offset: usize, kind: ParseErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Categories of parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected `{0}`")]
    ExpectedChar(char),

    #[error("expected a valid element or component name")]
    TagInvalidName,

    #[error("`<{0}>` was left open")]
    ElementUnclosed(String),

    #[error("expected `</{expected}>`, found `</{found}>`")]
    ExpectedClosingTag { expected: String, found: String },

    #[error("`</{0}>` attempted to close an element that was not open")]
    UnexpectedClosingTag(String),

    #[error("expected attribute value")]
    ExpectedAttributeValue,

    #[error("attribute shorthand cannot be empty")]
    AttributeEmptyShorthand,

    #[error("directive `{0}` is missing a name")]
    DirectiveMissingName(String),

    #[error("directive value must be a single `{{expression}}`")]
    DirectiveInvalidValue,

    #[error("expected an expression")]
    EmptyExpression,

    #[error("comment was left open")]
    UnclosedComment,

    #[error("a component can only have one instance-level and one module-level <script>")]
    ScriptDuplicate,

    #[error("a component can have a single top-level <style> element")]
    StyleDuplicate,

    #[error("if the context attribute is supplied, its value must be \"module\"")]
    ScriptInvalidContext,

    #[error("expected `html`, `render`, `const` or `debug` after `{{@`")]
    ExpectedTagType,

    #[error("`{{#{0}}}` blocks are not supported")]
    BlockUnsupported(String),

    #[error("`{{#{0}}}` block was left open")]
    BlockUnclosed(String),

    #[error("expected `{{/{expected}}}`, found `{{/{found}}}`")]
    BlockCloseMismatch { expected: String, found: String },

    #[error("expected {0}")]
    ExpectedBlockClause(String),

    #[error("`{0}` cannot appear more than once within a block")]
    BlockDuplicateClause(String),

    #[error("block tag has no matching opening block")]
    BlockUnexpectedTag,

    #[error("expected an identifier")]
    ExpectedIdentifier,

    #[error("expected a valid CSS identifier")]
    CssExpectedIdentifier,

    #[error("declaration cannot be empty")]
    CssEmptyDeclaration,

    #[error("invalid selector")]
    CssSelectorInvalid,

    #[error("failed to encode syntax tree: {0}")]
    AstEncoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_offset() {
        let err = ParseError::new(12, ParseErrorKind::ElementUnclosed("div".to_string()));
        assert_eq!(err.to_string(), "`<div>` was left open (at byte 12)");
    }

    #[test]
    fn test_block_errors_display_escape_braces() {
        let kind = ParseErrorKind::BlockUnsupported("snippet".to_string());
        assert_eq!(kind.to_string(), "`{#snippet}` blocks are not supported");

        let kind = ParseErrorKind::BlockCloseMismatch {
            expected: "if".to_string(),
            found: "each".to_string(),
        };
        assert_eq!(kind.to_string(), "expected `{/if}`, found `{/each}`");
    }

    #[test]
    fn test_boot_error_is_transparent() {
        let err: BootError = TargetNotFoundError::new("app").into();
        assert_eq!(err.to_string(), "mount target `#app` not found in document");
        assert!(matches!(err, BootError::TargetNotFound(_)));
    }
}
