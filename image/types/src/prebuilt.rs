/*++

Licensed under the Apache-2.0 license.

File Name:

   prebuilt.rs

Abstract:

    Prebuilt binary descriptor table and offset calculation.

--*/

use core::fmt;

use crate::{ImageDigest, ValidationError};

/// Type of an auxiliary binary appended after the FMC.
///
/// The numeric value is the on-flash encoding and must never change.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrebuiltType {
    /// Descriptor table terminator
    End = 0,
    Ddr4PmuTrainImem = 1,
    Ddr4PmuTrainDmem = 2,
    Ddr4_2dPmuTrainImem = 3,
    Ddr4_2dPmuTrainDmem = 4,
    Ddr5PmuTrainImem = 5,
    Ddr5PmuTrainDmem = 6,
    DpFw = 7,
    UefiAst2700 = 8,
}

impl PrebuiltType {
    pub const ALL: [PrebuiltType; 9] = [
        PrebuiltType::End,
        PrebuiltType::Ddr4PmuTrainImem,
        PrebuiltType::Ddr4PmuTrainDmem,
        PrebuiltType::Ddr4_2dPmuTrainImem,
        PrebuiltType::Ddr4_2dPmuTrainDmem,
        PrebuiltType::Ddr5PmuTrainImem,
        PrebuiltType::Ddr5PmuTrainDmem,
        PrebuiltType::DpFw,
        PrebuiltType::UefiAst2700,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PrebuiltType::End => "END",
            PrebuiltType::Ddr4PmuTrainImem => "DDR4_PMU_TRAIN_IMEM",
            PrebuiltType::Ddr4PmuTrainDmem => "DDR4_PMU_TRAIN_DMEM",
            PrebuiltType::Ddr4_2dPmuTrainImem => "DDR4_2D_PMU_TRAIN_IMEM",
            PrebuiltType::Ddr4_2dPmuTrainDmem => "DDR4_2D_PMU_TRAIN_DMEM",
            PrebuiltType::Ddr5PmuTrainImem => "DDR5_PMU_TRAIN_IMEM",
            PrebuiltType::Ddr5PmuTrainDmem => "DDR5_PMU_TRAIN_DMEM",
            PrebuiltType::DpFw => "DP_FW",
            PrebuiltType::UefiAst2700 => "UEFI_AST2700",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl From<PrebuiltType> for u32 {
    fn from(value: PrebuiltType) -> Self {
        value as u32
    }
}

impl TryFrom<u32> for PrebuiltType {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| u32::from(*t) == value)
            .ok_or(ValidationError::InvalidType(value))
    }
}

impl fmt::Display for PrebuiltType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One auxiliary binary descriptor. `digest` is only carried by V2 headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrebuiltEntry {
    pub r#type: PrebuiltType,
    pub size: u32,
    pub digest: Option<ImageDigest>,
}

impl PrebuiltEntry {
    /// Validate a raw (type, size) pair as it arrives from a caller
    pub(crate) fn validate(
        pb_type: u32,
        pb_size: u64,
        digest: Option<ImageDigest>,
    ) -> Result<Self, ValidationError> {
        let r#type = PrebuiltType::try_from(pb_type)?;
        if r#type == PrebuiltType::End {
            return Err(ValidationError::InvalidType(pb_type));
        }
        let size = u32::try_from(pb_size).map_err(|_| ValidationError::InvalidSize(pb_size))?;
        Ok(Self {
            r#type,
            size,
            digest,
        })
    }
}

/// Ordered, append-only descriptor list. Order is file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrebuiltTable {
    entries: Vec<PrebuiltEntry>,
}

impl PrebuiltTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: PrebuiltEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrebuiltEntry> {
        self.entries.iter()
    }

    /// File offset of every entry for a header of `hdr_size` bytes followed
    /// by an image of `image_size` bytes.
    pub fn offsets(&self, hdr_size: usize, image_size: u32) -> Vec<u64> {
        prebuilt_offsets(hdr_size, image_size, self.entries.iter().map(|e| e.size))
    }
}

impl<'a> IntoIterator for &'a PrebuiltTable {
    type Item = &'a PrebuiltEntry;
    type IntoIter = core::slice::Iter<'a, PrebuiltEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compute the absolute file offset of each prebuilt binary.
///
/// The output file is `header || image || prebuilt[0] || prebuilt[1] ...`,
/// so the first binary starts right after the image and each following one
/// right after its predecessor.
pub fn prebuilt_offsets(
    hdr_size: usize,
    image_size: u32,
    sizes: impl IntoIterator<Item = u32>,
) -> Vec<u64> {
    let mut ofst = hdr_size as u64 + u64::from(image_size);
    sizes
        .into_iter()
        .map(|size| {
            let cur = ofst;
            ofst += u64::from(size);
            cur
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_encoding_is_stable() {
        for (i, t) in PrebuiltType::ALL.iter().enumerate() {
            assert_eq!(u32::from(*t), i as u32);
            assert_eq!(PrebuiltType::try_from(i as u32), Ok(*t));
            assert_eq!(PrebuiltType::from_name(t.name()), Some(*t));
        }
        assert_eq!(
            PrebuiltType::try_from(9),
            Err(ValidationError::InvalidType(9))
        );
        assert_eq!(PrebuiltType::from_name("dp_fw"), None);
    }

    #[test]
    fn test_validate_rejects_terminator_and_wide_size() {
        assert_eq!(
            PrebuiltEntry::validate(0, 16, None),
            Err(ValidationError::InvalidType(0))
        );
        assert_eq!(
            PrebuiltEntry::validate(7, 1 << 32, None),
            Err(ValidationError::InvalidSize(1 << 32))
        );
        let entry = PrebuiltEntry::validate(7, 200, None).unwrap();
        assert_eq!(entry.r#type, PrebuiltType::DpFw);
        assert_eq!(entry.size, 200);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(
            prebuilt_offsets(2560, 1000, [200, 16, 0, 4]),
            vec![3560, 3760, 3776, 3776]
        );
        assert!(prebuilt_offsets(128, 10, []).is_empty());
        assert_eq!(prebuilt_offsets(128, u32::MAX, [u32::MAX, 1]), vec![
            128 + u64::from(u32::MAX),
            128 + 2 * u64::from(u32::MAX)
        ]);
    }
}
