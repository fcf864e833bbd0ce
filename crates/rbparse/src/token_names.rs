//! Human-readable token names for diagnostics.
//!
//! The grammar keeps raw terminal names for kinds whose spelling is shared
//! with a sibling (`tBDOT2` next to `".."`, `tUMINUS` next to `"-"`). Those
//! names mean nothing to a user, so they are replaced here with the
//! spelling the user actually typed. Every other kind uses the grammar's own
//! name.

use crate::lexer::TokenKind;

/// Name of `kind` as shown in diagnostic messages
#[must_use]
pub const fn display_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::BDot2 => "\"..\"",
        TokenKind::BDot3 => "\"...\"",
        TokenKind::BackRef => "\"`\"",
        TokenKind::Amper2 => "\"&\"",
        TokenKind::Star2 => "\"*\"",
        TokenKind::LBrack2 => "\"[\"",
        TokenKind::LParen2 => "\"(\"",
        TokenKind::Colon3 => "\"::\"",
        TokenKind::Pow => "\"**\"",
        TokenKind::UPlus => "\"unary +\"",
        TokenKind::UMinus => "\"unary -\"",
        _ => kind.symbol_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        assert_eq!(display_name(TokenKind::BDot2), "\"..\"");
        assert_eq!(display_name(TokenKind::BDot3), "\"...\"");
        assert_eq!(display_name(TokenKind::BackRef), "\"`\"");
        assert_eq!(display_name(TokenKind::Amper2), "\"&\"");
        assert_eq!(display_name(TokenKind::Star2), "\"*\"");
        assert_eq!(display_name(TokenKind::LBrack2), "\"[\"");
        assert_eq!(display_name(TokenKind::LParen2), "\"(\"");
        assert_eq!(display_name(TokenKind::Colon3), "\"::\"");
        assert_eq!(display_name(TokenKind::Pow), "\"**\"");
        assert_eq!(display_name(TokenKind::UPlus), "\"unary +\"");
        assert_eq!(display_name(TokenKind::UMinus), "\"unary -\"");
    }

    #[test]
    fn test_overridden_siblings_match_their_plain_forms() {
        assert_eq!(display_name(TokenKind::BDot2), display_name(TokenKind::Dot2));
        assert_eq!(display_name(TokenKind::BDot3), display_name(TokenKind::Dot3));
        assert_eq!(display_name(TokenKind::Star2), display_name(TokenKind::Star));
        assert_eq!(display_name(TokenKind::Amper2), display_name(TokenKind::Amper));
        assert_eq!(display_name(TokenKind::LParen2), display_name(TokenKind::LParen));
        assert_eq!(display_name(TokenKind::LBrack2), display_name(TokenKind::LBrack));
        assert_eq!(display_name(TokenKind::Colon3), display_name(TokenKind::Colon2));
    }

    #[test]
    fn test_everything_else_delegates() {
        for kind in [
            TokenKind::KwDef,
            TokenKind::KwEnd,
            TokenKind::Identifier,
            TokenKind::Dot2,
            TokenKind::Plus,
            TokenKind::BeforeEof,
        ] {
            assert_eq!(display_name(kind), kind.symbol_name());
        }
    }
}
