use crate::text::{TextRange, TextSize};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Terminal symbols of the grammar.
///
/// Several spellings map to more than one kind depending on lexer state: `+`
/// is [`Plus`](Self::Plus) after an operand and [`UPlus`](Self::UPlus) where
/// an expression begins, `..` is [`Dot2`](Self::Dot2) or the beginless
/// [`BDot2`](Self::BDot2), and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TokenKind {
    // keywords
    KwDef,
    KwEnd,
    KwClass,
    KwModule,
    KwIf,
    KwElsif,
    KwElse,
    KwUnless,
    KwWhile,
    KwDo,
    /// `do` closing a loop condition
    KwDoCond,
    KwBegin,
    KwRescue,
    KwEnsure,
    KwThen,
    KwReturn,
    KwSelf,
    KwNil,
    KwTrue,
    KwFalse,

    // names and literals
    Identifier,
    Constant,
    IVar,
    GVar,
    BackRef,
    Symbol,
    Integer,
    String,

    // operators
    Plus,
    Minus,
    UPlus,
    UMinus,
    /// splat `*`
    Star,
    /// binary `*`
    Star2,
    Pow,
    Divide,
    /// block-pass `&`
    Amper,
    /// binary `&`
    Amper2,
    Dot,
    Dot2,
    Dot3,
    BDot2,
    BDot3,
    /// scoped `::`
    Colon2,
    /// top-level `::`
    Colon3,
    /// call `(`
    LParen,
    /// grouping `(`
    LParen2,
    RParen,
    /// index `[`
    LBrack,
    /// array literal `[`
    LBrack2,
    RBrack,
    Comma,
    Semi,
    Eql,
    Eq,
    Assoc,
    Lt,
    Gt,
    Pipe,

    Newline,
    /// Emitted once when the scanner reaches the end of the source
    BeforeEof,
    /// Returned for every request after [`BeforeEof`](Self::BeforeEof)
    EndOfInput,
}

impl TokenKind {
    /// The grammar's own name for this terminal.
    ///
    /// Ordinary terminals are named by their quoted spelling. Terminals that
    /// share a spelling with a sibling keep their raw grammar names.
    #[must_use]
    pub const fn symbol_name(self) -> &'static str {
        match self {
            Self::KwDef => "\"def\"",
            Self::KwEnd => "\"end\"",
            Self::KwClass => "\"class\"",
            Self::KwModule => "\"module\"",
            Self::KwIf => "\"if\"",
            Self::KwElsif => "\"elsif\"",
            Self::KwElse => "\"else\"",
            Self::KwUnless => "\"unless\"",
            Self::KwWhile => "\"while\"",
            Self::KwDo => "\"do\"",
            Self::KwDoCond => "\"do\" for condition",
            Self::KwBegin => "\"begin\"",
            Self::KwRescue => "\"rescue\"",
            Self::KwEnsure => "\"ensure\"",
            Self::KwThen => "\"then\"",
            Self::KwReturn => "\"return\"",
            Self::KwSelf => "\"self\"",
            Self::KwNil => "\"nil\"",
            Self::KwTrue => "\"true\"",
            Self::KwFalse => "\"false\"",
            Self::Identifier => "local variable or method",
            Self::Constant => "constant",
            Self::IVar => "instance variable",
            Self::GVar => "global variable",
            Self::BackRef => "tBACK_REF",
            Self::Symbol => "symbol literal",
            Self::Integer => "numeric literal",
            Self::String => "string literal",
            Self::Plus => "\"+\"",
            Self::Minus => "\"-\"",
            Self::UPlus => "tUPLUS",
            Self::UMinus => "tUMINUS",
            Self::Star => "\"*\"",
            Self::Star2 => "tSTAR2",
            Self::Pow => "tPOW",
            Self::Divide => "\"/\"",
            Self::Amper => "\"&\"",
            Self::Amper2 => "tAMPER2",
            Self::Dot => "\".\"",
            Self::Dot2 => "\"..\"",
            Self::Dot3 => "\"...\"",
            Self::BDot2 => "tBDOT2",
            Self::BDot3 => "tBDOT3",
            Self::Colon2 => "\"::\"",
            Self::Colon3 => "tCOLON3",
            Self::LParen => "\"(\"",
            Self::LParen2 => "tLPAREN2",
            Self::RParen => "\")\"",
            Self::LBrack => "\"[\"",
            Self::LBrack2 => "tLBRACK2",
            Self::RBrack => "\"]\"",
            Self::Comma => "\",\"",
            Self::Semi => "\";\"",
            Self::Eql => "\"=\"",
            Self::Eq => "\"==\"",
            Self::Assoc => "\"=>\"",
            Self::Lt => "\"<\"",
            Self::Gt => "\">\"",
            Self::Pipe => "\"|\"",
            Self::Newline => "newline",
            Self::BeforeEof => "end-of-input",
            Self::EndOfInput => "$end",
        }
    }

    /// Keyword kind for an identifier spelling
    #[must_use]
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "def" => Self::KwDef,
            "end" => Self::KwEnd,
            "class" => Self::KwClass,
            "module" => Self::KwModule,
            "if" => Self::KwIf,
            "elsif" => Self::KwElsif,
            "else" => Self::KwElse,
            "unless" => Self::KwUnless,
            "while" => Self::KwWhile,
            "do" => Self::KwDo,
            "begin" => Self::KwBegin,
            "rescue" => Self::KwRescue,
            "ensure" => Self::KwEnsure,
            "then" => Self::KwThen,
            "return" => Self::KwReturn,
            "self" => Self::KwSelf,
            "nil" => Self::KwNil,
            "true" => Self::KwTrue,
            "false" => Self::KwFalse,
            _ => return None,
        };
        Some(kind)
    }

    #[inline]
    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::KwDef
                | Self::KwEnd
                | Self::KwClass
                | Self::KwModule
                | Self::KwIf
                | Self::KwElsif
                | Self::KwElse
                | Self::KwUnless
                | Self::KwWhile
                | Self::KwDo
                | Self::KwDoCond
                | Self::KwBegin
                | Self::KwRescue
                | Self::KwEnsure
                | Self::KwThen
                | Self::KwReturn
                | Self::KwSelf
                | Self::KwNil
                | Self::KwTrue
                | Self::KwFalse
        )
    }

    /// Statement separators
    #[inline]
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        matches!(self, Self::Newline | Self::Semi)
    }

    /// The end-of-file sentinel or anything after it
    #[inline]
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, Self::BeforeEof | Self::EndOfInput)
    }
}

/// A token produced by the lexer.
///
/// Tokens are plain values over the source buffer: a kind, the byte range the
/// token covers and the start offset of the line it begins on. The text is
/// recovered by slicing the source with [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
    /// Offset of the first byte of the line containing `range.start()`
    pub line_start: TextSize,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, range: TextRange, line_start: TextSize) -> Self {
        Self {
            kind,
            range,
            line_start,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> TextSize {
        self.range.start()
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> TextSize {
        self.range.end()
    }

    /// Whether this is the end-of-file sentinel
    #[inline]
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }

    /// Source text covered by the token; empty if the range is out of bounds
    #[must_use]
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        source
            .get(self.start().to_usize()..self.end().to_usize())
            .unwrap_or("")
    }
}
