//! # Error Types
//!
//! Errors returned by the driver API.
//!
//! Problems in the parsed source are never returned as errors; they are
//! recorded as [`Diagnostic`](crate::diagnostics::Diagnostic)s and the parse
//! carries on. `DriverError` covers misuse of the driver itself.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum DriverError {
    /// `parse` was called a second time on the same driver
    #[error("driver has already parsed its source")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(driver::already_parsed),
            help("construct a new driver for every parse")
        )
    )]
    AlreadyParsed,
}

/// Result type for driver entry points
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_parsed_display() {
        assert_eq!(
            DriverError::AlreadyParsed.to_string(),
            "driver has already parsed its source"
        );
    }
}
