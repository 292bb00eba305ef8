// diag.rs — Warning diagnostics for composition runs
//
// Fatal problems abort a run through `ComposeError`; everything the engine
// recovers from (tokens without a semantic action, unbalanced parentheses,
// leftover operands) is reported as a `Diagnostic` and the run continues.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use serde::Serialize;

use crate::lexer::Span;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `W0001`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    /// A recognised token with no semantic action (stray `[`, `]`, integer).
    pub const UNKNOWN_TOKEN: DiagCode = DiagCode("W0001");
    /// `)` with no matching `(`.
    pub const UNBALANCED_CLOSE: DiagCode = DiagCode("W0002");
    /// `(` still open at end of input.
    pub const UNCLOSED_OPEN: DiagCode = DiagCode("W0003");
    /// `()` with nothing inside.
    pub const EMPTY_GROUP: DiagCode = DiagCode("W0004");
    /// More than one operand left in a group or at the root once its operators were applied.
    pub const LEFTOVER_OPERANDS: DiagCode = DiagCode("W0005");
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A warning emitted while composing. Every diagnostic carries a code.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub span: Span,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a coded warning with no hint.
    pub fn warning(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            span,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]: {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
