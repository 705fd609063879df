use thiserror::Error;

/// Errors that can occur while decoding caption data.
///
/// The four classes are deliberately distinguishable: truncated input
/// abandons one segment, `NotImplemented` marks reserved codes a
/// conformant stream may carry, `NotUsedByStandard` marks codes ARIB
/// STD-B24 forbids in caption statements, and `Unreachable` is a
/// programming error in the dispatch tables.
#[derive(Error, Debug)]
pub enum B24Error {
    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Invalid data unit separator: expected 0x1F, got 0x{0:02x}")]
    InvalidUnitSeparator(u8),

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Not used per ARIB STD-B24: {0}")]
    NotUsedByStandard(&'static str),

    #[error("Unreachable: {0}")]
    Unreachable(&'static str),
}

impl B24Error {
    /// Convenience bounds check used by every record parser.
    pub(crate) fn check_len(data: &[u8], expected: usize) -> std::result::Result<(), B24Error> {
        if data.len() < expected {
            Err(B24Error::InsufficientData {
                expected,
                actual: data.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// Result type for caption decoding operations.
pub type Result<T> = std::result::Result<T, B24Error>;
