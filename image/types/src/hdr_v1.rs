/*++

Licensed under the Apache-2.0 license.

File Name:

   hdr_v1.rs

Abstract:

    Unsigned V1 FMC header: magic, version, FMC size and a (type, size)
    descriptor table.

--*/

use core::mem::size_of;

use getset::{CopyGetters, Getters};
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::hdr::{check_unused, log_banner, log_field};
use crate::layout::{
    FmcHdrV1Body, FmcHdrV1Layout, FmcHdrV1Preamble, PrebuiltEntryV1, HDR_V1_BODY_FIXED_SIZE,
};
use crate::{
    DecodeError, FmcHeader, HeaderCommon, HeaderError, HeaderResult, HeaderVersion, PrebuiltEntry,
    PrebuiltTable, PrebuiltType, ValidationError,
};

pub const HDR_V1_PREAMBLE_SIZE: usize = 0x8;
pub const HDR_V1_BODY_SIZE: usize = 0x78;
pub const HDR_V1_SIZE: usize = HDR_V1_PREAMBLE_SIZE + HDR_V1_BODY_SIZE;
/// 88KB
pub const HDR_V1_MAX_FMC_SIZE: u32 = 0x16000;
pub const HDR_V1_MAX_PREBUILT: usize = 14;

#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters)]
pub struct FmcHdrV1 {
    #[getset(get_copy = "pub")]
    common: HeaderCommon,

    /// FMC size in bytes
    #[getset(get_copy = "pub")]
    image_size: u32,

    #[getset(get = "pub")]
    prebuilts: PrebuiltTable,
}

impl Default for FmcHdrV1 {
    fn default() -> Self {
        Self::new()
    }
}

impl FmcHdrV1 {
    pub fn new() -> Self {
        Self {
            common: HeaderCommon::new(HeaderVersion::V1),
            image_size: 0,
            prebuilts: PrebuiltTable::new(),
        }
    }

    pub fn set_image_size(&mut self, size: u64) -> Result<(), ValidationError> {
        match u32::try_from(size) {
            Ok(sz) if sz <= HDR_V1_MAX_FMC_SIZE => {
                self.image_size = sz;
                Ok(())
            }
            _ => Err(ValidationError::InvalidImageSize {
                size,
                max: HDR_V1_MAX_FMC_SIZE,
            }),
        }
    }

    /// Append a prebuilt descriptor. Order is the physical file order.
    pub fn add_prebuilt(&mut self, pb_type: u32, pb_size: u64) -> Result<(), ValidationError> {
        let entry = PrebuiltEntry::validate(pb_type, pb_size, None)?;
        self.prebuilts.push(entry);
        Ok(())
    }

    /// Decode a V1 header from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> HeaderResult<Self> {
        let (common, version) = HeaderCommon::parse(bytes)?;
        if version != HeaderVersion::V1 {
            return Err(DecodeError::UnsupportedVersion(common.version).into());
        }
        let (layout, _) = FmcHdrV1Layout::read_from_prefix(bytes).map_err(|_| {
            DecodeError::Truncated {
                len: bytes.len(),
                expected: HDR_V1_SIZE,
            }
        })?;

        let mut hdr = Self::new();
        hdr.set_image_size(layout.body.image_size.get().into())?;
        for pb in layout
            .body
            .prebuilts
            .iter()
            .take_while(|pb| pb.r#type.get() != u32::from(PrebuiltType::End))
        {
            hdr.add_prebuilt(pb.r#type.get(), pb.size.get().into())?;
        }

        let used = HDR_V1_PREAMBLE_SIZE
            + HDR_V1_BODY_FIXED_SIZE
            + hdr.prebuilts.len() * size_of::<PrebuiltEntryV1>();
        check_unused(layout.as_bytes(), used..HDR_V1_SIZE)?;
        Ok(hdr)
    }
}

impl FmcHeader for FmcHdrV1 {
    const VERSION: HeaderVersion = HeaderVersion::V1;
    const PREAMBLE_SIZE: usize = HDR_V1_PREAMBLE_SIZE;
    const BODY_SIZE: usize = HDR_V1_BODY_SIZE;

    fn emit_preamble(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        if verbose {
            log_banner("PREAMBLE");
            log_field("MAGIC", format_args!("{:#x}", self.common.magic));
            log_field("VERSION", format_args!("{:#x}", self.common.version));
        }

        let mut preamble = FmcHdrV1Preamble::new_zeroed();
        preamble.magic.set(self.common.magic);
        preamble.version.set(self.common.version);

        Ok(preamble.as_bytes().to_vec())
    }

    fn emit_body(&self, verbose: bool) -> HeaderResult<Vec<u8>> {
        if verbose {
            log_banner("BODY");
            log_field("FMC SIZE", format_args!("{:#x}", self.image_size));
            let offsets = self.prebuilts.offsets(Self::SIZE, self.image_size);
            for (pb, ofst) in self.prebuilts.iter().zip(offsets) {
                log_field(
                    "Prebuilt Type",
                    format_args!("{:#x} ({})", pb.r#type as u32, pb.r#type),
                );
                log_field("Prebuilt Offset", format_args!("{ofst:#x}"));
                log_field("Prebuilt Size", format_args!("{:#x}", pb.size));
            }
        }

        if self.prebuilts.len() > HDR_V1_MAX_PREBUILT {
            return Err(HeaderError::LayoutOverflow {
                region: "body",
                size: HDR_V1_BODY_FIXED_SIZE + self.prebuilts.len() * size_of::<PrebuiltEntryV1>(),
                capacity: HDR_V1_BODY_SIZE,
            });
        }

        let mut body = FmcHdrV1Body::new_zeroed();
        body.image_size.set(self.image_size);
        for (slot, pb) in body.prebuilts.iter_mut().zip(self.prebuilts.iter()) {
            slot.r#type.set(pb.r#type.into());
            slot.size.set(pb.size);
        }

        Ok(body.as_bytes().to_vec())
    }
}
