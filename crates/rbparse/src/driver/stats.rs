use crate::text::TextSize;

/// Statistics collected during one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Tokens pulled from the lexer, rescans and unadvanced tokens included
    pub tokens_lexed: usize,
    /// Tokens the automaton consumed
    pub tokens_consumed: usize,
    /// Cursor rewinds
    pub backtracks: usize,
    /// Tokens put back on the lexer queue
    pub unadvances: usize,
    /// Sum over all rewinds of how far the cursor moved back
    pub bytes_reprocessed: usize,
    /// Deepest scope nesting reached
    pub max_depth: usize,
    /// Target of the most recent rewind
    pub last_rewind: Option<TextSize>,
}

impl ParseStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tokens_lexed: 0,
            tokens_consumed: 0,
            backtracks: 0,
            unadvances: 0,
            bytes_reprocessed: 0,
            max_depth: 0,
            last_rewind: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matches_default() {
        assert_eq!(ParseStats::new(), ParseStats::default());
        assert_eq!(ParseStats::new().last_rewind, None::<TextSize>);
    }
}
