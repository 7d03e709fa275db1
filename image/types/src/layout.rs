/*++

Licensed under the Apache-2.0 license.

File Name:

   layout.rs

Abstract:

    On-flash layout of the V1 and V2 FMC headers. All integers are
    little-endian regardless of host byte order.

--*/

use core::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, Unaligned, U32};

use crate::{
    ECC384_SIG_BYTE_SIZE, HDR_V1_BODY_SIZE, HDR_V1_MAX_PREBUILT, HDR_V1_PREAMBLE_SIZE,
    HDR_V1_SIZE, HDR_V2_BODY_SIZE, HDR_V2_MAX_PREBUILT, HDR_V2_PREAMBLE_SIZE, HDR_V2_SIZE,
    LMS_SIG_BYTE_SIZE, SHA384_DIGEST_BYTE_SIZE,
};

macro_rules! static_assert {
    ($expression:expr) => {
        const _: () = assert!($expression);
    };
}

pub type Le32 = U32<LittleEndian>;

/// Leading fields shared by every header version
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrCommon {
    pub magic: Le32,
    pub version: Le32,
}

pub type FmcHdrV1Preamble = FmcHdrCommon;

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct PrebuiltEntryV1 {
    pub r#type: Le32,
    pub size: Le32,
}

pub const HDR_V1_BODY_FIXED_SIZE: usize = size_of::<Le32>();
pub const HDR_V1_BODY_RESERVED: usize =
    HDR_V1_BODY_SIZE - HDR_V1_BODY_FIXED_SIZE - HDR_V1_MAX_PREBUILT * size_of::<PrebuiltEntryV1>();

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrV1Body {
    pub image_size: Le32,
    pub prebuilts: [PrebuiltEntryV1; HDR_V1_MAX_PREBUILT],
    pub reserved: [u8; HDR_V1_BODY_RESERVED],
}

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrV1Layout {
    pub preamble: FmcHdrV1Preamble,
    pub body: FmcHdrV1Body,
}

static_assert!(size_of::<FmcHdrV1Preamble>() == HDR_V1_PREAMBLE_SIZE);
static_assert!(size_of::<FmcHdrV1Body>() == HDR_V1_BODY_SIZE);
static_assert!(size_of::<FmcHdrV1Layout>() == HDR_V1_SIZE);

pub const HDR_V2_PREAMBLE_FIXED_SIZE: usize =
    size_of::<FmcHdrCommon>() + 2 * size_of::<Le32>() + ECC384_SIG_BYTE_SIZE + LMS_SIG_BYTE_SIZE;
pub const HDR_V2_PREAMBLE_RESERVED: usize = HDR_V2_PREAMBLE_SIZE - HDR_V2_PREAMBLE_FIXED_SIZE;

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrV2Preamble {
    pub magic: Le32,
    pub version: Le32,
    pub ecc_key_index: Le32,
    pub lms_key_index: Le32,
    /// r || s, both big-endian
    pub ecc_signature: [u8; ECC384_SIG_BYTE_SIZE],
    pub lms_signature: [u8; LMS_SIG_BYTE_SIZE],
    pub reserved: [u8; HDR_V2_PREAMBLE_RESERVED],
}

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct PrebuiltEntryV2 {
    pub r#type: Le32,
    pub size: Le32,
    pub digest: [u8; SHA384_DIGEST_BYTE_SIZE],
}

pub const HDR_V2_BODY_FIXED_SIZE: usize = 2 * size_of::<Le32>() + SHA384_DIGEST_BYTE_SIZE;
pub const HDR_V2_BODY_RESERVED: usize =
    HDR_V2_BODY_SIZE - HDR_V2_BODY_FIXED_SIZE - HDR_V2_MAX_PREBUILT * size_of::<PrebuiltEntryV2>();

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrV2Body {
    pub svn: Le32,
    pub image_size: Le32,
    pub image_digest: [u8; SHA384_DIGEST_BYTE_SIZE],
    pub prebuilts: [PrebuiltEntryV2; HDR_V2_MAX_PREBUILT],
    pub reserved: [u8; HDR_V2_BODY_RESERVED],
}

#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug)]
pub struct FmcHdrV2Layout {
    pub preamble: FmcHdrV2Preamble,
    pub body: FmcHdrV2Body,
}

static_assert!(size_of::<PrebuiltEntryV2>() == 56);
static_assert!(size_of::<FmcHdrV2Preamble>() == HDR_V2_PREAMBLE_SIZE);
static_assert!(size_of::<FmcHdrV2Body>() == HDR_V2_BODY_SIZE);
static_assert!(size_of::<FmcHdrV2Layout>() == HDR_V2_SIZE);

#[cfg(test)]
mod tests {
    use super::*;
    use memoffset::offset_of;

    #[test]
    fn test_v2_field_offsets() {
        assert_eq!(offset_of!(FmcHdrV2Preamble, magic), 0);
        assert_eq!(offset_of!(FmcHdrV2Preamble, version), 4);
        assert_eq!(offset_of!(FmcHdrV2Preamble, ecc_key_index), 8);
        assert_eq!(offset_of!(FmcHdrV2Preamble, lms_key_index), 12);
        assert_eq!(offset_of!(FmcHdrV2Preamble, ecc_signature), 16);
        assert_eq!(offset_of!(FmcHdrV2Preamble, lms_signature), 112);

        let body = offset_of!(FmcHdrV2Layout, body);
        assert_eq!(body, 1792);
        assert_eq!(body + offset_of!(FmcHdrV2Body, svn), 1792);
        assert_eq!(body + offset_of!(FmcHdrV2Body, image_size), 1796);
        assert_eq!(body + offset_of!(FmcHdrV2Body, image_digest), 1800);
        assert_eq!(body + offset_of!(FmcHdrV2Body, prebuilts), 1848);
    }

    #[test]
    fn test_v1_field_offsets() {
        assert_eq!(offset_of!(FmcHdrV1Layout, body), 8);
        assert_eq!(offset_of!(FmcHdrV1Body, prebuilts), 4);
        assert_eq!(HDR_V1_BODY_RESERVED, 4);
        assert_eq!(HDR_V2_BODY_RESERVED, 40);
        assert_eq!(HDR_V2_PREAMBLE_RESERVED, 60);
    }
}
