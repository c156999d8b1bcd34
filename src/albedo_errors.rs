use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlbedoError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    #[error("Invalid day of year: {0} (expected 1..=366)")]
    InvalidDayOfYear(u32),

    #[error("Invalid accumulator file name: {0}")]
    InvalidFileName(String),

    #[error("Unexpected size for {path}: expected {expected} bytes, found {actual}")]
    FileSizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Binary decoding failed: {0}")]
    BinaryDecodeError(String),

    #[error("Raster dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid processing parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid tile scale factor: {0}")]
    InvalidTileScaleFactor(f64),
}

impl PartialEq for AlbedoError {
    fn eq(&self, other: &Self) -> bool {
        use AlbedoError::*;
        match (self, other) {
            // Not comparable: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (ConfigParseError(_), ConfigParseError(_)) => true,

            (InvalidDayOfYear(a), InvalidDayOfYear(b)) => a == b,
            (InvalidFileName(a), InvalidFileName(b)) => a == b,
            (
                FileSizeMismatch {
                    path: p1,
                    expected: e1,
                    actual: a1,
                },
                FileSizeMismatch {
                    path: p2,
                    expected: e2,
                    actual: a2,
                },
            ) => p1 == p2 && e1 == e2 && a1 == a2,
            (BinaryDecodeError(a), BinaryDecodeError(b)) => a == b,
            (DimensionMismatch(a), DimensionMismatch(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidTileScaleFactor(a), InvalidTileScaleFactor(b)) => a == b,

            _ => false,
        }
    }
}
