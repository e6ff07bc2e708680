use thiserror::Error;

/// Errors raised by run encoding, blob records and the labeling pass.
///
/// All of these are caller-contract violations. They abort processing of the
/// current frame; nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("x0={x0} does not fit in {bits} bits")]
    X0OutOfRange { x0: u32, bits: u32 },

    #[error("x1={x1} does not fit in {bits} bits")]
    X1OutOfRange { x1: u32, bits: u32 },

    #[error("y={y} does not fit in {bits} bits")]
    YOutOfRange { y: u32, bits: u32 },

    #[error("span x1-x0={span} (x0={x0}, x1={x1}) does not fit in {bits} bits")]
    SpanOutOfRange { x0: u32, x1: u32, span: u32, bits: u32 },

    #[error("x1={x1} is smaller than x0={x0}")]
    InvertedRun { x0: u32, x1: u32 },

    #[error("packed value {packed:#x} has bits outside the run fields")]
    InvalidPacked { packed: u64 },

    #[error("comparing to an invalid blob id does not produce a meaningful order")]
    InvalidBid,

    #[error("cannot parse blob id from '{0}'")]
    ParseBid(String),

    #[error("blob has no runs")]
    EmptyBlob,

    #[error("blob properties have not been calculated yet")]
    PropertiesNotReady,

    #[error("moving run {line} by ({dx}, {dy}) leaves the encodable range")]
    OffsetOutOfRange { line: String, dx: i32, dy: i32 },

    #[error("run {line} lies outside the {width}x{height} image")]
    OutOfBounds {
        line: String,
        width: usize,
        height: usize,
    },

    #[error("runs must be sorted by (y, x0): run {index} comes before its predecessor")]
    UnsortedRuns { index: usize },

    #[error("pixel buffer holds {actual} samples but the runs cover {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },

    #[error("compressed run at index {index} is inconsistent: {reason}")]
    InvalidCompressed { index: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, BlobError>;
