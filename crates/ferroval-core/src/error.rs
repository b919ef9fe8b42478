use thiserror::Error;

/// Structural errors raised while decoding the textual wire format.
///
/// These cover framing damage only: input that cannot be walked as elements
/// at all. Field-level damage (an unparseable date or value inside an intact
/// element) never raises; it is absorbed by the default-fill policy in
/// [`crate::wire`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("expected {expected} at offset {offset}")]
    ExpectedToken {
        expected: &'static str,
        offset: usize,
    },

    #[error("unterminated attribute value starting at offset {offset}")]
    UnterminatedAttribute { offset: usize },

    #[error("unknown element '{name}' at offset {offset}")]
    UnknownElement { name: String, offset: usize },

    #[error("closing tag '</{found}>' where '</{expected}>' was expected")]
    MismatchedClose { expected: String, found: String },
}

/// Top-level error type for series persistence.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
