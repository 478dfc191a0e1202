//! Error taxonomy shared by the registry, parser, and tiling pass.
//!
//! Every failure aborts the current call and surfaces a kind plus a
//! human-readable reason. The code generator is total and has no errors.

use crate::diagnostic::Diagnostic;
use crate::ir::NodeKind;
use crate::span::Span;

/// Errors produced while building, transforming, or configuring kernels.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Malformed DSL text.
    #[error("parse error: {reason}")]
    Parse { reason: String, span: Span },

    /// An access names a tensor that is not in the registry.
    #[error("unknown tensor '{name}'")]
    UnknownTensor { name: String, span: Option<Span> },

    /// A tensor with this name is already registered.
    #[error("tensor '{name}' is already registered")]
    DuplicateName { name: String },

    /// Rank/extent validation failed at registration.
    #[error("shape mismatch for tensor '{name}': {reason}")]
    ShapeMismatch { name: String, reason: String },

    /// An `Assign` was built with a target that is neither a store nor a variable.
    #[error("invalid assignment target: {kind} (expected store or variable)")]
    InvalidAssignTarget { kind: NodeKind },

    /// The tiling pass was given a tree that is not a clean two-level nest.
    #[error("tiling precondition violated: {reason}")]
    StructuralPrecondition { reason: String },

    /// The configuration file could not be read or understood.
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Coarse classification of a [`CompileError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    UnknownTensor,
    DuplicateName,
    ShapeMismatch,
    InvalidAssignTarget,
    StructuralPrecondition,
    Config,
}

impl CompileError {
    pub(crate) fn parse(reason: impl Into<String>, span: Span) -> Self {
        CompileError::Parse {
            reason: reason.into(),
            span,
        }
    }

    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        CompileError::StructuralPrecondition {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        CompileError::Config {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Parse { .. } => ErrorKind::Parse,
            CompileError::UnknownTensor { .. } => ErrorKind::UnknownTensor,
            CompileError::DuplicateName { .. } => ErrorKind::DuplicateName,
            CompileError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            CompileError::InvalidAssignTarget { .. } => ErrorKind::InvalidAssignTarget,
            CompileError::StructuralPrecondition { .. } => ErrorKind::StructuralPrecondition,
            CompileError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Source location of the error, when it points into DSL text.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parse { span, .. } => Some(*span),
            CompileError::UnknownTensor { span, .. } => *span,
            _ => None,
        }
    }

    /// Convert into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string(), self.span().unwrap_or_default());
        match self {
            CompileError::UnknownTensor { .. } => diag
                .with_help("declare the tensor in tilec.toml under [tensors]".to_string()),
            CompileError::Parse { .. } => diag.with_note(
                "expected `LOOPS: i=lb:ub:step, ... BODY: T[i, ...] = expr`".to_string(),
            ),
            CompileError::StructuralPrecondition { .. } => diag.with_note(
                "tiling needs exactly two nested loops around one assignment".to_string(),
            ),
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_span() {
        let e = CompileError::parse("missing 'BODY:' section marker", Span::new(0, 5));
        assert_eq!(e.kind(), ErrorKind::Parse);
        assert_eq!(e.span(), Some(Span::new(0, 5)));

        let e = CompileError::UnknownTensor {
            name: "Z".to_string(),
            span: None,
        };
        assert_eq!(e.kind(), ErrorKind::UnknownTensor);
        assert_eq!(e.span(), None);
        assert_eq!(e.to_string(), "unknown tensor 'Z'");
    }

    #[test]
    fn test_to_diagnostic() {
        let e = CompileError::UnknownTensor {
            name: "Z".to_string(),
            span: Some(Span::new(10, 11)),
        };
        let d = e.to_diagnostic();
        assert_eq!(d.message, "unknown tensor 'Z'");
        assert_eq!(d.span, Span::new(10, 11));
        assert!(d.help.is_some());

        let d = CompileError::precondition("root is not a loop (found assign node)").to_diagnostic();
        assert_eq!(d.span, Span::default());
        assert_eq!(d.notes.len(), 1);
    }

    #[test]
    fn test_messages() {
        let e = CompileError::InvalidAssignTarget {
            kind: NodeKind::Load,
        };
        assert_eq!(
            e.to_string(),
            "invalid assignment target: load (expected store or variable)"
        );
        let e = CompileError::ShapeMismatch {
            name: "A".to_string(),
            reason: "extent 0 in dimension 1".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "shape mismatch for tensor 'A': extent 0 in dimension 1"
        );
    }
}
