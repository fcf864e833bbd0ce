//! # Diagnostics
//!
//! Append-only log of problems found in the source.
//!
//! ## Overview
//!
//! Every recovery the driver performs leaves a [`Diagnostic`] behind, and the
//! lexer reports malformed input the same way. Records are never removed or
//! edited once appended, even when later recovery undoes the decision a record
//! explains. The log is readable after `parse` returns.
//!
//! With the `diagnostics` feature enabled, [`Diagnostic`] implements
//! [`miette::Diagnostic`] with the primary and secondary tokens as labels.

use crate::lexer::Token;
use crate::text::LineIndex;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt::{self, Write};
use thiserror::Error;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum DiagnosticClass {
    /// A construct reached end of file without its `end`
    EOFInsteadOfEnd,
    /// A construct's `end` sits left of its opener
    DedentedEnd,
    /// A definition name was expected on the opener's line
    DefMissingName,
    /// The driver was asked to do something it cannot; recovery is skipped
    InternalError,
    UnexpectedToken,
    UnexpectedChar,
    UnterminatedString,
    ClassInDef,
    ModuleInDef,
    InconsistentIndentation,
}

impl DiagnosticClass {
    /// Severity a record of this class is logged with by default
    #[must_use]
    pub const fn default_level(self) -> DiagnosticLevel {
        match self {
            Self::InconsistentIndentation => DiagnosticLevel::Warning,
            _ => DiagnosticLevel::Error,
        }
    }

    /// Stable code, also used as the miette diagnostic code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EOFInsteadOfEnd => "rbparse::eof_instead_of_end",
            Self::DedentedEnd => "rbparse::dedented_end",
            Self::DefMissingName => "rbparse::def_missing_name",
            Self::InternalError => "rbparse::internal_error",
            Self::UnexpectedToken => "rbparse::unexpected_token",
            Self::UnexpectedChar => "rbparse::unexpected_char",
            Self::UnterminatedString => "rbparse::unterminated_string",
            Self::ClassInDef => "rbparse::class_in_def",
            Self::ModuleInDef => "rbparse::module_in_def",
            Self::InconsistentIndentation => "rbparse::inconsistent_indentation",
        }
    }
}

fn arg(args: &[CompactString], idx: usize) -> &str {
    args.get(idx).map_or("", CompactString::as_str)
}

fn format_message(class: &DiagnosticClass, args: &[CompactString]) -> String {
    match class {
        DiagnosticClass::EOFInsteadOfEnd => format!(
            "unexpected end of file; {} is missing a matching \"end\"",
            arg(args, 0)
        ),
        DiagnosticClass::DedentedEnd => format!(
            "{} might not be properly closed; the \"end\" is dedented",
            arg(args, 0)
        ),
        DiagnosticClass::DefMissingName => {
            format!("{} is missing a name on the same line", arg(args, 0))
        }
        DiagnosticClass::InternalError => format!("internal error: {}", arg(args, 0)),
        DiagnosticClass::UnexpectedToken => format!("unexpected token {}", arg(args, 0)),
        DiagnosticClass::UnexpectedChar => format!("unexpected character '{}'", arg(args, 0)),
        DiagnosticClass::UnterminatedString => "unterminated string literal".to_string(),
        DiagnosticClass::ClassInDef => "class definition in method body".to_string(),
        DiagnosticClass::ModuleInDef => "module definition in method body".to_string(),
        DiagnosticClass::InconsistentIndentation => {
            "indentation mixes tabs and spaces".to_string()
        }
    }
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[error("{}", format_message(.class, .args))]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub class: DiagnosticClass,
    /// Token the diagnostic points at
    pub primary: Token,
    /// Related token, e.g. the dedented `end` for a construct
    pub secondary: Option<Token>,
    /// Display strings interpolated into the message
    pub args: SmallVec<[CompactString; 2]>,
}

impl Diagnostic {
    #[must_use]
    pub fn message(&self) -> String {
        format_message(&self.class, &self.args)
    }

    /// Render as `file:line:col: level: message`, with 1-based line and column
    #[must_use]
    pub fn render(&self, source: &str, filename: &str) -> String {
        let index = LineIndex::new(source);
        self.render_with_index(&index, filename)
    }

    /// Like [`render`](Self::render), reusing a prebuilt line index
    #[must_use]
    pub fn render_with_index(&self, index: &LineIndex, filename: &str) -> String {
        let pos = index.line_col(self.primary.start());
        let mut out = String::new();
        let _ = write!(
            out,
            "{}:{}:{}: {}: {}",
            filename,
            pos.line + 1,
            pos.column + 1,
            self.level,
            self.message()
        );
        if let Some(secondary) = self.secondary {
            let pos = index.line_col(secondary.start());
            let _ = write!(out, " (see {}:{}:{})", filename, pos.line + 1, pos.column + 1);
        }
        out
    }
}

#[cfg(feature = "diagnostics")]
impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.class.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.level {
            DiagnosticLevel::Error => miette::Severity::Error,
            DiagnosticLevel::Warning => miette::Severity::Warning,
        })
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let primary =
            miette::LabeledSpan::new_with_span(Some("here".to_string()), self.primary.range);
        let secondary = self
            .secondary
            .map(|tok| miette::LabeledSpan::new_with_span(Some("related".to_string()), tok.range));
        Some(Box::new(std::iter::once(primary).chain(secondary)))
    }
}

/// The ordered diagnostics log
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a record at the class's default level
    pub fn record<I, S>(
        &mut self,
        class: DiagnosticClass,
        primary: Token,
        args: I,
        secondary: Option<Token>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.record_with_level(class.default_level(), class, primary, args, secondary);
    }

    pub fn record_with_level<I, S>(
        &mut self,
        level: DiagnosticLevel,
        class: DiagnosticClass,
        primary: Token,
        args: I,
        secondary: Option<Token>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        let diagnostic = Diagnostic {
            level,
            class,
            primary,
            secondary,
            args: args.into_iter().map(Into::into).collect(),
        };
        tracing::debug!(
            class = ?diagnostic.class,
            level = %diagnostic.level,
            at = %diagnostic.primary.range,
            "recorded diagnostic: {}",
            diagnostic.message()
        );
        self.entries.push(diagnostic);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    /// Number of records of one class
    #[must_use]
    pub fn count(&self, class: DiagnosticClass) -> usize {
        self.entries.iter().filter(|d| d.class == class).count()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use crate::text::{TextRange, TextSize};

    fn tok(kind: TokenKind, start: u32, end: u32) -> Token {
        Token::new(
            kind,
            TextRange::new(TextSize::new(start), TextSize::new(end)),
            TextSize::zero(),
        )
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut log = Diagnostics::new();
        log.record(
            DiagnosticClass::EOFInsteadOfEnd,
            tok(TokenKind::KwDef, 0, 3),
            ["\"def\""],
            None,
        );
        log.record(
            DiagnosticClass::DedentedEnd,
            tok(TokenKind::KwIf, 4, 6),
            ["\"if\""],
            Some(tok(TokenKind::KwEnd, 10, 13)),
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.as_slice()[0].class, DiagnosticClass::EOFInsteadOfEnd);
        assert_eq!(log.as_slice()[1].class, DiagnosticClass::DedentedEnd);
        assert_eq!(log.count(DiagnosticClass::DedentedEnd), 1);
        assert!(log.has_errors());
    }

    #[test]
    fn test_messages() {
        let mut log = Diagnostics::new();
        log.record(
            DiagnosticClass::DefMissingName,
            tok(TokenKind::KwDef, 0, 3),
            ["\"def\""],
            None,
        );
        log.record(
            DiagnosticClass::UnterminatedString,
            tok(TokenKind::String, 0, 3),
            std::iter::empty::<&str>(),
            None,
        );
        assert_eq!(
            log.as_slice()[0].message(),
            "\"def\" is missing a name on the same line"
        );
        assert_eq!(log.as_slice()[0].to_string(), log.as_slice()[0].message());
        assert_eq!(log.as_slice()[1].message(), "unterminated string literal");
    }

    #[test]
    fn test_warning_level() {
        let mut log = Diagnostics::new();
        log.record(
            DiagnosticClass::InconsistentIndentation,
            tok(TokenKind::Identifier, 0, 1),
            std::iter::empty::<&str>(),
            None,
        );
        assert_eq!(log.as_slice()[0].level, DiagnosticLevel::Warning);
        assert!(!log.has_errors());
    }

    #[test]
    fn test_render_location() {
        let source = "def f\n  x\n";
        let mut log = Diagnostics::new();
        log.record(
            DiagnosticClass::UnexpectedChar,
            tok(TokenKind::Identifier, 8, 9),
            ["?"],
            None,
        );
        assert_eq!(
            log.as_slice()[0].render(source, "a.rb"),
            "a.rb:2:3: error: unexpected character '?'"
        );
    }
}
