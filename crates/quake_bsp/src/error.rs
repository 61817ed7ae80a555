//! Error types that can be emitted from this library
//!

use miette::Diagnostic;
use thiserror::Error;

use crate::types::LumpKind;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Stream ended before the fixed-size header could be read
    #[error("file is too small to hold a bsp header")]
    TruncatedHeader,

    /// The header's version field does not match the supported format
    #[error("unsupported bsp version {}, expected {}", .0, crate::types::BSP_VERSION)]
    UnsupportedVersion(i32),

    /// A lump directory entry carries a negative offset or length
    #[error("{lump} lump has invalid bounds (offset={offset}, length={length})")]
    InvalidLumpBounds {
        /// Lump the directory entry belongs to
        lump: LumpKind,
        /// Declared byte offset
        offset: i32,
        /// Declared byte length
        length: i32,
    },

    /// A lump's declared length exceeds the bytes available in the stream
    #[error("{0} lump is truncated")]
    TruncatedLump(LumpKind),

    /// The miptexture lump is too short for its own directory table
    #[error("miptexture directory is truncated")]
    TruncatedMiptexDirectory,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
