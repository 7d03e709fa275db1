/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the FMC boot header and image bundle.

--*/

mod error;
mod hdr;
mod hdr_v1;
mod hdr_v2;
pub mod layout;
mod prebuilt;

pub use error::{DecodeError, HeaderError, HeaderResult, ValidationError};
pub use hdr::{FmcHdr, FmcHeader, HeaderCommon, HeaderVersion};
pub use hdr_v1::*;
pub use hdr_v2::*;
pub use prebuilt::{prebuilt_offsets, PrebuiltEntry, PrebuiltTable, PrebuiltType};

/// Header magic, "ASTH" when read as little-endian bytes
pub const HDR_MAGIC: u32 = 0x48545341;
/// Version value of a header that has not been bound to a layout yet
pub const HDR_VERSION_UNSET: u32 = 0xFFFF_FFFF;

pub const SHA384_DIGEST_BYTE_SIZE: usize = 48;
pub const SHA192_DIGEST_BYTE_SIZE: usize = 24;
pub const ECC384_SCALAR_BYTE_SIZE: usize = 48;
pub const ECC384_SIG_BYTE_SIZE: usize = ECC384_SCALAR_BYTE_SIZE * 2;
/// LMS_SHA256_N24_H15 + LMOTS_SHA256_N24_W4
pub const LMS_SIG_BYTE_SIZE: usize = 1620;
pub const LMS_IDENTIFIER_BYTE_SIZE: usize = 16;

/// Corresponds to the 64-bit SVN bitmap in OTP
pub const HDR_MAX_SVN: u32 = 64;
/// Corresponds to the 16-bit key revocation bitmap in OTP
pub const HDR_MAX_KEYID: u32 = 16;

pub type ImageDigest = [u8; SHA384_DIGEST_BYTE_SIZE];
pub type ImageScalar = [u8; ECC384_SCALAR_BYTE_SIZE];
pub type ImageEccPrivKey = ImageScalar;
pub type LmsIdentifier = [u8; LMS_IDENTIFIER_BYTE_SIZE];
pub type LmsHash = [u8; SHA192_DIGEST_BYTE_SIZE];

/// ECC-384 public key, big-endian affine coordinates
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageEccPubKey {
    /// X Coordinate
    pub x: ImageScalar,

    /// Y Coordinate
    pub y: ImageScalar,
}

/// ECDSA-384 signature, big-endian integers
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageEccSignature {
    /// Random point
    pub r: ImageScalar,

    /// Proof
    pub s: ImageScalar,
}

// Arrays past 32 elements have no `Default`
impl Default for ImageEccPubKey {
    fn default() -> Self {
        Self {
            x: [0u8; ECC384_SCALAR_BYTE_SIZE],
            y: [0u8; ECC384_SCALAR_BYTE_SIZE],
        }
    }
}

impl Default for ImageEccSignature {
    fn default() -> Self {
        Self {
            r: [0u8; ECC384_SCALAR_BYTE_SIZE],
            s: [0u8; ECC384_SCALAR_BYTE_SIZE],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LmsAlgorithmType(pub u32);

impl LmsAlgorithmType {
    #![allow(non_upper_case_globals)]

    pub const LmsReserved: Self = Self(0);
    pub const LmsSha256N24H5: Self = Self(10);
    pub const LmsSha256N24H10: Self = Self(11);
    pub const LmsSha256N24H15: Self = Self(12);
    pub const LmsSha256N24H20: Self = Self(13);
    pub const LmsSha256N24H25: Self = Self(14);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LmotsAlgorithmType(pub u32);

impl LmotsAlgorithmType {
    #![allow(non_upper_case_globals)]

    pub const LmotsReserved: Self = Self(0);
    pub const LmotsSha256N24W1: Self = Self(5);
    pub const LmotsSha256N24W2: Self = Self(6);
    pub const LmotsSha256N24W4: Self = Self(7);
    pub const LmotsSha256N24W8: Self = Self(8);
}

/// LMS private key. `q` is the next unused leaf.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ImageLmsPrivKey {
    pub tree_type: LmsAlgorithmType,

    pub otstype: LmotsAlgorithmType,

    pub id: LmsIdentifier,

    pub seed: LmsHash,

    pub q: u32,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ImageLmsPublicKey {
    pub tree_type: LmsAlgorithmType,

    pub otstype: LmotsAlgorithmType,

    pub id: LmsIdentifier,

    pub digest: LmsHash,
}

/// LM-OTS part of an LMS signature
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ImageLmOtsSignature {
    pub ots_type: LmotsAlgorithmType,

    /// Randomizer `C`
    pub random: LmsHash,

    /// Hash chain values `y[0..p]`
    pub sig: Vec<LmsHash>,
}

/// Structured LMS signature as returned by the signer
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ImageLmsSignature {
    /// Leaf index
    pub q: u32,

    pub ots_sig: ImageLmOtsSignature,

    pub tree_type: LmsAlgorithmType,

    /// Merkle authentication path, leaf to root
    pub tree_path: Vec<LmsHash>,
}

/// FMC image bundle: header, FMC and prebuilt binaries in file order
#[derive(Debug, Default, Clone)]
pub struct ImageBundle {
    /// Serialized header
    pub header: Vec<u8>,

    /// FMC
    pub fmc: Vec<u8>,

    /// Prebuilt binaries in descriptor order
    pub prebuilts: Vec<Vec<u8>>,
}

impl ImageBundle {
    /// Total size of the bundle when written out
    pub fn len(&self) -> usize {
        self.header.len() + self.fmc.len() + self.prebuilts.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
