// error.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
use std::fmt;
use std::io;
use std::num::TryFromIntError;

/// Errors encountered while building an animation
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error (output path unwritable, etc.).
    Io(io::Error),
    /// Integer out of bounds.
    TryFromInt(TryFromIntError),
    /// Palette byte length is not `3 * 2^(k+1)` for `k` in `0..=7`.
    InvalidPaletteSize(usize),
    /// No selection region to render.
    EmptySelection,
    /// Selection or canvas dimensions do not fit in 16 bits.
    CanvasTooLarge,
    /// Malformed configuration value, raised by the parameter source.
    InvalidParameter(String),
    /// Cell state does not index an entry of the color table.
    InvalidColorIndex,
    /// LZW minimum code size outside of `2..=8` (or `2..=11` on decode).
    InvalidCodeSize,
    /// Compressed LZW data invalid or corrupt
    InvalidLzwData,
    /// Animation finished before all frames were encoded.
    IncompleteAnimation,
}

/// Giffer result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::TryFromInt(err) => err.fmt(fmt),
            Error::InvalidParameter(msg) => {
                write!(fmt, "invalid parameter: {}", msg)
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::TryFromInt(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::TryFromInt(err)
    }
}
