// Licensed under the Apache-2.0 license

use thiserror::Error;

use crate::{
    ECC384_SCALAR_BYTE_SIZE, HDR_MAGIC, HDR_MAX_KEYID, HDR_MAX_SVN, LMS_SIG_BYTE_SIZE,
    SHA384_DIGEST_BYTE_SIZE,
};

pub type HeaderResult<T> = Result<T, HeaderError>;

/// Rejected field assignment. The header is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid prebuilt binary type={0}")]
    InvalidType(u32),

    #[error("invalid prebuilt binary size={0:#x}, maximum {:#x}", u32::MAX)]
    InvalidSize(u64),

    #[error("invalid image size={size:#x}, maximum {max:#x}")]
    InvalidImageSize { size: u64, max: u32 },

    #[error("invalid {field} digest length={len}, expected {}", SHA384_DIGEST_BYTE_SIZE)]
    InvalidDigestLength { field: &'static str, len: usize },

    #[error("invalid ECC key index={0}, expected 0 ~ {}", HDR_MAX_KEYID - 1)]
    InvalidEccKeyIndex(u32),

    #[error("invalid LMS key index={0}, expected 0 ~ {}", HDR_MAX_KEYID - 1)]
    InvalidLmsKeyIndex(u32),

    #[error("invalid SVN={0}, maximum {}", HDR_MAX_SVN)]
    InvalidSvn(u32),

    #[error("invalid ECDSA384 '{component}' length={len}, expected {}", ECC384_SCALAR_BYTE_SIZE)]
    InvalidEccSignature { component: &'static str, len: usize },

    #[error("invalid LMS N24/H15/W4 length={0}, expected {}", LMS_SIG_BYTE_SIZE)]
    InvalidLmsSignature(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("header truncated: {len} bytes, expected at least {expected}")]
    Truncated { len: usize, expected: usize },

    #[error("invalid header magic={0:#x}, expected {:#x}", HDR_MAGIC)]
    InvalidMagic(u32),

    #[error("unsupported header version={0:#x}")]
    UnsupportedVersion(u32),

    /// Padding and unused descriptor slots must stay zero so the header
    /// re-encodes to the bytes it was decoded from
    #[error("non-zero byte in unused header space at offset {0:#x}")]
    UnusedNotZero(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Too many descriptors for the fixed region. A caller bug, not bad input.
    #[error("invalid {region} size={size}, expected <= {capacity}")]
    LayoutOverflow {
        region: &'static str,
        size: usize,
        capacity: usize,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
