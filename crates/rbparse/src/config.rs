//! # Driver Configuration
//!
//! Settings fixed at driver construction: the language version the lexer
//! follows, whether indentation drives recovery, lexer tracing and the
//! release/debug variant of the automaton.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Language version accepted by the scanner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum RubyVersion {
    Ruby26,
    Ruby27,
    #[default]
    Ruby31,
}

impl RubyVersion {
    /// Beginless ranges (`..x`) were introduced in 2.7
    #[must_use]
    pub const fn has_beginless_ranges(self) -> bool {
        !matches!(self, Self::Ruby26)
    }
}

/// Which build of the automaton drives the parse.
///
/// The choice is made at runtime: the release variant never forwards the
/// parser trace level, so the automaton's rule events stay disabled, but
/// their `tracing` call sites are still compiled in. To strip them from a
/// binary, cap the level with one of `tracing`'s `release_max_level_*`
/// features in the final crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Variant {
    #[default]
    Release,
    Debug,
}

/// Configuration for a [`Driver`](crate::driver::Driver)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Language version passed to the lexer
    pub version: RubyVersion,

    /// Use indentation to recover from missing or misplaced `end`
    pub indentation_aware: bool,

    /// Emit a trace event for every scanned token
    pub trace_lexer: bool,

    /// Release or debug automaton
    pub variant: Variant,

    /// Cap on the total bytes rescanned by body recovery. Unlimited by
    /// default; once reached, a misplaced body is kept whole instead of being
    /// cut back and rescanned.
    pub reprocess_limit: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            version: RubyVersion::default(),
            indentation_aware: true,
            trace_lexer: false,
            variant: Variant::default(),
            reprocess_limit: None,
        }
    }
}

impl DriverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_version(mut self, version: RubyVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn with_indentation_aware(mut self, aware: bool) -> Self {
        self.indentation_aware = aware;
        self
    }

    #[must_use]
    pub const fn with_trace_lexer(mut self, trace: bool) -> Self {
        self.trace_lexer = trace;
        self
    }

    #[must_use]
    pub const fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub const fn with_reprocess_limit(mut self, bytes: usize) -> Self {
        self.reprocess_limit = Some(bytes);
        self
    }
}
