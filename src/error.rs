use thiserror::Error;

use crate::parameters::FrameFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedEncoding {
    #[error("invalid format ({0})")]
    Format(FrameFormat),

    #[error("invalid bit depth ({0})")]
    Depth(i32),

    #[error("invalid scanner (3-pass)")]
    MultiPass,

    #[error("invalid scanner (hand-scanner, lines = {0})")]
    UnknownHeight(i32),

    #[error("unexpected image size ({bytes_per_line} bytes per line, {pixels_per_line} pixels per line, {lines} lines)")]
    ImageSize {
        bytes_per_line: i32,
        pixels_per_line: i32,
        lines: i32,
    },

    #[error("unexpected byte count ({bytes_per_line} bytes per line for {bits} bits)")]
    ByteCount { bytes_per_line: i32, bits: i64 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported encoding: {0}")]
    Unsupported(#[from] UnsupportedEncoding),

    #[error("scan session failed: {0}")]
    Session(String),

    #[error("unknown image type {0:?}")]
    UnknownType(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
