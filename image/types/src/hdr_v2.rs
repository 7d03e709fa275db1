/*++

Licensed under the Apache-2.0 license.

File Name:

   hdr_v2.rs

Abstract:

    Signed V2 FMC header. The preamble carries the key index hints and the
    ECC/LMS signature slots, the body carries everything that is signed.

--*/

use core::mem::size_of;
use core::ops::Range;

use getset::{CopyGetters, Getters};
use memoffset::span_of;
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::hdr::{check_unused, log_banner, log_field};
use crate::layout::{
    FmcHdrV2Body, FmcHdrV2Layout, FmcHdrV2Preamble, PrebuiltEntryV2, HDR_V2_BODY_FIXED_SIZE,
    HDR_V2_PREAMBLE_FIXED_SIZE,
};
use crate::{
    DecodeError, FmcHeader, HeaderCommon, HeaderError, HeaderResult, HeaderVersion, ImageDigest,
    PrebuiltEntry, PrebuiltTable, PrebuiltType, ValidationError, ECC384_SCALAR_BYTE_SIZE,
    ECC384_SIG_BYTE_SIZE, HDR_MAX_KEYID, HDR_MAX_SVN, LMS_SIG_BYTE_SIZE, SHA384_DIGEST_BYTE_SIZE,
};

pub const HDR_V2_PREAMBLE_SIZE: usize = 0x700;
pub const HDR_V2_BODY_SIZE: usize = 0x300;
pub const HDR_V2_SIZE: usize = HDR_V2_PREAMBLE_SIZE + HDR_V2_BODY_SIZE;
/// 224KB
pub const HDR_V2_MAX_FMC_SIZE: u32 = 0x38000;
pub const HDR_V2_MAX_PREBUILT: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters)]
pub struct FmcHdrV2 {
    #[getset(get_copy = "pub")]
    common: HeaderCommon,

    #[getset(get_copy = "pub")]
    ecc_key_index: u32,

    #[getset(get_copy = "pub")]
    lms_key_index: u32,

    /// r || s, all zero when unsigned
    #[getset(get = "pub")]
    ecc_signature: [u8; ECC384_SIG_BYTE_SIZE],

    /// Flattened LMS signature, all zero when unsigned
    #[getset(get = "pub")]
    lms_signature: Box<[u8; LMS_SIG_BYTE_SIZE]>,

    #[getset(get_copy = "pub")]
    svn: u32,

    /// FMC size in bytes
    #[getset(get_copy = "pub")]
    image_size: u32,

    /// SHA2-384 of the FMC
    #[getset(get = "pub")]
    image_digest: ImageDigest,

    #[getset(get = "pub")]
    prebuilts: PrebuiltTable,
}

impl Default for FmcHdrV2 {
    fn default() -> Self {
        Self::new()
    }
}

fn digest_from_slice(field: &'static str, dgst: &[u8]) -> Result<ImageDigest, ValidationError> {
    dgst.try_into()
        .map_err(|_| ValidationError::InvalidDigestLength {
            field,
            len: dgst.len(),
        })
}

impl FmcHdrV2 {
    pub fn new() -> Self {
        Self {
            common: HeaderCommon::new(HeaderVersion::V2),
            ecc_key_index: 0,
            lms_key_index: 0,
            ecc_signature: [0u8; ECC384_SIG_BYTE_SIZE],
            lms_signature: Box::new([0u8; LMS_SIG_BYTE_SIZE]),
            svn: 0,
            image_size: 0,
            image_digest: [0u8; SHA384_DIGEST_BYTE_SIZE],
            prebuilts: PrebuiltTable::new(),
        }
    }

    /// Byte range of the signed body within the header
    pub fn body_range() -> Range<usize> {
        span_of!(FmcHdrV2Layout, body)
    }

    pub fn set_ecc_key_index(&mut self, idx: u32) -> Result<(), ValidationError> {
        if idx >= HDR_MAX_KEYID {
            return Err(ValidationError::InvalidEccKeyIndex(idx));
        }
        self.ecc_key_index = idx;
        Ok(())
    }

    /// Store an ECDSA-384 signature given as big-endian `r` and `s`
    pub fn set_ecc_signature(&mut self, r: &[u8], s: &[u8]) -> Result<(), ValidationError> {
        if r.len() != ECC384_SCALAR_BYTE_SIZE {
            return Err(ValidationError::InvalidEccSignature {
                component: "r",
                len: r.len(),
            });
        }
        if s.len() != ECC384_SCALAR_BYTE_SIZE {
            return Err(ValidationError::InvalidEccSignature {
                component: "s",
                len: s.len(),
            });
        }
        let (sig_r, sig_s) = self.ecc_signature.split_at_mut(ECC384_SCALAR_BYTE_SIZE);
        sig_r.copy_from_slice(r);
        sig_s.copy_from_slice(s);
        Ok(())
    }

    pub fn set_lms_key_index(&mut self, idx: u32) -> Result<(), ValidationError> {
        if idx >= HDR_MAX_KEYID {
            return Err(ValidationError::InvalidLmsKeyIndex(idx));
        }
        self.lms_key_index = idx;
        Ok(())
    }

    /// Store a flattened LMS signature. Bytes past the slot are dropped.
    pub fn set_lms_signature(&mut self, sig: &[u8]) -> Result<(), ValidationError> {
        if sig.len() < LMS_SIG_BYTE_SIZE {
            return Err(ValidationError::InvalidLmsSignature(sig.len()));
        }
        self.lms_signature.copy_from_slice(&sig[..LMS_SIG_BYTE_SIZE]);
        Ok(())
    }

    pub fn set_svn(&mut self, svn: u32) -> Result<(), ValidationError> {
        if svn > HDR_MAX_SVN {
            return Err(ValidationError::InvalidSvn(svn));
        }
        self.svn = svn;
        Ok(())
    }

    pub fn set_image_size(&mut self, size: u64) -> Result<(), ValidationError> {
        match u32::try_from(size) {
            Ok(sz) if sz <= HDR_V2_MAX_FMC_SIZE => {
                self.image_size = sz;
                Ok(())
            }
            _ => Err(ValidationError::InvalidImageSize {
                size,
                max: HDR_V2_MAX_FMC_SIZE,
            }),
        }
    }

    pub fn set_image_digest(&mut self, dgst: &[u8]) -> Result<(), ValidationError> {
        self.image_digest = digest_from_slice("image", dgst)?;
        Ok(())
    }

    /// Append a prebuilt descriptor. Order is the physical file order.
    pub fn add_prebuilt(
        &mut self,
        pb_type: u32,
        pb_size: u64,
        pb_dgst: &[u8],
    ) -> Result<(), ValidationError> {
        let entry = PrebuiltEntry::validate(pb_type, pb_size, None)?;
        let digest = digest_from_slice("prebuilt binary", pb_dgst)?;
        self.prebuilts.push(PrebuiltEntry {
            digest: Some(digest),
            ..entry
        });
        Ok(())
    }

    pub fn is_ecc_signed(&self) -> bool {
        self.ecc_signature.iter().any(|b| *b != 0)
    }

    pub fn is_lms_signed(&self) -> bool {
        self.lms_signature.iter().any(|b| *b != 0)
    }

    /// Decode a V2 header from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> HeaderResult<Self> {
        let (common, version) = HeaderCommon::parse(bytes)?;
        if version != HeaderVersion::V2 {
            return Err(DecodeError::UnsupportedVersion(common.version).into());
        }
        let (layout, _) = FmcHdrV2Layout::read_from_prefix(bytes).map_err(|_| {
            DecodeError::Truncated {
                len: bytes.len(),
                expected: HDR_V2_SIZE,
            }
        })?;
        let preamble = &layout.preamble;
        let body = &layout.body;

        let mut hdr = Self::new();
        hdr.set_ecc_key_index(preamble.ecc_key_index.get())?;
        hdr.set_lms_key_index(preamble.lms_key_index.get())?;
        let (r, s) = preamble.ecc_signature.split_at(ECC384_SCALAR_BYTE_SIZE);
        hdr.set_ecc_signature(r, s)?;
        hdr.set_lms_signature(&preamble.lms_signature)?;

        hdr.set_svn(body.svn.get())?;
        hdr.set_image_size(body.image_size.get().into())?;
        hdr.set_image_digest(&body.image_digest)?;
        for pb in body
            .prebuilts
            .iter()
            .take_while(|pb| pb.r#type.get() != u32::from(PrebuiltType::End))
        {
            hdr.add_prebuilt(pb.r#type.get(), pb.size.get().into(), &pb.digest)?;
        }

        let header = layout.as_bytes();
        check_unused(header, HDR_V2_PREAMBLE_FIXED_SIZE..HDR_V2_PREAMBLE_SIZE)?;
        let used = HDR_V2_PREAMBLE_SIZE
            + HDR_V2_BODY_FIXED_SIZE
            + hdr.prebuilts.len() * size_of::<PrebuiltEntryV2>();
        check_unused(header, used..HDR_V2_SIZE)?;
        Ok(hdr)
    }
}

impl FmcHeader for FmcHdrV2 {
    const VERSION: HeaderVersion = HeaderVersion::V2;
    const PREAMBLE_SIZE: usize = HDR_V2_PREAMBLE_SIZE;
    const BODY_SIZE: usize = HDR_V2_BODY_SIZE;

    fn emit_preamble(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        if verbose {
            log_banner("PREAMBLE");
            log_field("MAGIC", format_args!("{:#x}", self.common.magic));
            log_field("VERSION", format_args!("{:#x}", self.common.version));
            log_field("ECC_KEY_INDEX", format_args!("{:#x}", self.ecc_key_index));
            log_field("LMS_KEY_INDEX", format_args!("{:#x}", self.lms_key_index));
            log_field("ECC_SIGNATURE (32 MSByte)", hex::encode(&self.ecc_signature[..32]));
            log_field("LMS_SIGNATURE (32 MSByte)", hex::encode(&self.lms_signature[..32]));
        }

        let mut preamble = FmcHdrV2Preamble::new_zeroed();
        preamble.magic.set(self.common.magic);
        preamble.version.set(self.common.version);
        preamble.ecc_key_index.set(self.ecc_key_index);
        preamble.lms_key_index.set(self.lms_key_index);
        preamble.ecc_signature = self.ecc_signature;
        preamble.lms_signature = *self.lms_signature;

        Ok(preamble.as_bytes().to_vec())
    }

    fn emit_body(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        if verbose {
            log_banner("BODY");
            log_field("FMC SIZE", format_args!("{:#x}", self.image_size));
            log_field("FMC SVN", format_args!("{:#x}", self.svn));
            log_field("FMC DIGEST", hex::encode(self.image_digest));
            let offsets = self.prebuilts.offsets(Self::SIZE, self.image_size);
            for (pb, ofst) in self.prebuilts.iter().zip(offsets) {
                log_field(
                    "Prebuilt Type",
                    format_args!("{:#x} ({})", pb.r#type as u32, pb.r#type),
                );
                log_field("Prebuilt Offset", format_args!("{ofst:#x}"));
                log_field("Prebuilt Size", format_args!("{:#x}", pb.size));
                if let Some(dgst) = &pb.digest {
                    log_field("Prebuilt Digest", hex::encode(dgst));
                }
            }
        }

        if self.prebuilts.len() > HDR_V2_MAX_PREBUILT {
            return Err(HeaderError::LayoutOverflow {
                region: "body",
                size: HDR_V2_BODY_FIXED_SIZE + self.prebuilts.len() * size_of::<PrebuiltEntryV2>(),
                capacity: HDR_V2_BODY_SIZE,
            });
        }

        let mut body = FmcHdrV2Body::new_zeroed();
        body.svn.set(self.svn);
        body.image_size.set(self.image_size);
        body.image_digest = self.image_digest;
        for (slot, pb) in body.prebuilts.iter_mut().zip(self.prebuilts.iter()) {
            slot.r#type.set(pb.r#type.into());
            slot.size.set(pb.size);
            slot.digest = pb.digest.unwrap_or([0u8; SHA384_DIGEST_BYTE_SIZE]);
        }

        Ok(body.as_bytes().to_vec())
    }
}
