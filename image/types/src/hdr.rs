/*++

Licensed under the Apache-2.0 license.

File Name:

   hdr.rs

Abstract:

    Version independent FMC header contract.

--*/

use core::fmt::Display;
use core::ops::Range;

use zerocopy::FromBytes;

use crate::layout::FmcHdrCommon;
use crate::{
    DecodeError, FmcHdrV1, FmcHdrV2, HeaderResult, PrebuiltTable, HDR_MAGIC, HDR_VERSION_UNSET,
};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderVersion {
    V1 = 1,
    V2 = 2,
}

impl From<HeaderVersion> for u32 {
    fn from(value: HeaderVersion) -> Self {
        value as u32
    }
}

impl TryFrom<u32> for HeaderVersion {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HeaderVersion::V1),
            2 => Ok(HeaderVersion::V2),
            _ => Err(DecodeError::UnsupportedVersion(value)),
        }
    }
}

/// Fields every serialized header starts with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderCommon {
    pub magic: u32,
    pub version: u32,
}

impl Default for HeaderCommon {
    fn default() -> Self {
        Self {
            magic: HDR_MAGIC,
            version: HDR_VERSION_UNSET,
        }
    }
}

impl HeaderCommon {
    pub fn new(version: HeaderVersion) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Read and check the leading magic/version pair
    pub fn parse(bytes: &[u8]) -> Result<(Self, HeaderVersion), DecodeError> {
        let (common, _) =
            FmcHdrCommon::read_from_prefix(bytes).map_err(|_| DecodeError::Truncated {
                len: bytes.len(),
                expected: core::mem::size_of::<FmcHdrCommon>(),
            })?;

        let magic = common.magic.get();
        if magic != HDR_MAGIC {
            return Err(DecodeError::InvalidMagic(magic));
        }
        let version = HeaderVersion::try_from(common.version.get())?;

        Ok((
            Self {
                magic,
                version: version.into(),
            },
            version,
        ))
    }
}

/// Header contract implemented by every layout version.
///
/// `verbose` only routes a field dump to the log, it never changes the bytes.
pub trait FmcHeader {
    const VERSION: HeaderVersion;
    const PREAMBLE_SIZE: usize;
    const BODY_SIZE: usize;
    const SIZE: usize = Self::PREAMBLE_SIZE + Self::BODY_SIZE;

    /// Serialize the preamble, zero padded to `PREAMBLE_SIZE`
    fn emit_preamble(&self, verbose: bool) -> HeaderResult<Vec<u8>>;

    /// Serialize the body, zero padded to `BODY_SIZE`
    fn emit_body(&self, verbose: bool) -> HeaderResult<Vec<u8>>;

    /// Serialize the whole header. Always `preamble || body`.
    fn emit_full(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        let mut hdr = self.emit_preamble(verbose)?;
        hdr.extend_from_slice(&self.emit_body(verbose)?);
        Ok(hdr)
    }
}

/// A header of either version, as found in an image
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FmcHdr {
    V1(FmcHdrV1),
    V2(FmcHdrV2),
}

impl FmcHdr {
    /// Decode a header from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> HeaderResult<Self> {
        let (_, version) = HeaderCommon::parse(bytes)?;
        match version {
            HeaderVersion::V1 => Ok(FmcHdr::V1(FmcHdrV1::parse(bytes)?)),
            HeaderVersion::V2 => Ok(FmcHdr::V2(FmcHdrV2::parse(bytes)?)),
        }
    }

    pub fn version(&self) -> HeaderVersion {
        match self {
            FmcHdr::V1(_) => FmcHdrV1::VERSION,
            FmcHdr::V2(_) => FmcHdrV2::VERSION,
        }
    }

    /// Serialized header size
    pub fn size(&self) -> usize {
        match self {
            FmcHdr::V1(_) => FmcHdrV1::SIZE,
            FmcHdr::V2(_) => FmcHdrV2::SIZE,
        }
    }

    pub fn image_size(&self) -> u32 {
        match self {
            FmcHdr::V1(hdr) => hdr.image_size(),
            FmcHdr::V2(hdr) => hdr.image_size(),
        }
    }

    pub fn prebuilts(&self) -> &PrebuiltTable {
        match self {
            FmcHdr::V1(hdr) => hdr.prebuilts(),
            FmcHdr::V2(hdr) => hdr.prebuilts(),
        }
    }

    /// File offsets of the prebuilt binaries following this header
    pub fn prebuilt_offsets(&self) -> Vec<u64> {
        self.prebuilts().offsets(self.size(), self.image_size())
    }

    pub fn emit_full(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        match self {
            FmcHdr::V1(hdr) => hdr.emit_full(verbose),
            FmcHdr::V2(hdr) => hdr.emit_full(verbose),
        }
    }
}

/// Fail on the first non-zero byte of `header[unused]`
pub(crate) fn check_unused(header: &[u8], unused: Range<usize>) -> Result<(), DecodeError> {
    let start = unused.start;
    match header[unused].iter().position(|b| *b != 0) {
        Some(pos) => Err(DecodeError::UnusedNotZero(start + pos)),
        None => Ok(()),
    }
}

pub(crate) fn log_banner(title: &str) {
    log::info!("--------------");
    log::info!("{title}");
    log::info!("--------------");
}

pub(crate) fn log_field(name: &str, value: impl Display) {
    log::info!("{name:<25}: {value}");
}
