/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the FMC Image Generator.

--*/

mod generator;
pub mod signing;

pub use generator::ImageGenerator;

use anyhow::Context;
use fmc_image_types::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Image Generator Crypto Trait
pub trait ImageGeneratorCrypto {
    /// Calculate SHA2-384 digest
    fn sha384_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest>;

    /// Calculate ECDSA-384 signature over SHA2-384(`data`)
    fn ecdsa384_sign(
        &self,
        data: &[u8],
        priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature>;

    /// Verify ECDSA-384 signature over SHA2-384(`data`)
    fn ecdsa384_verify(
        &self,
        data: &[u8],
        pub_key: &ImageEccPubKey,
        sig: &ImageEccSignature,
    ) -> anyhow::Result<bool>;

    /// Calculate LMS signature over a SHA2-384 digest
    fn lms_sign(
        &self,
        digest: &ImageDigest,
        priv_key: &ImageLmsPrivKey,
    ) -> anyhow::Result<ImageLmsSignature>;

    /// Verify LMS signature over a SHA2-384 digest
    fn lms_verify(
        &self,
        digest: &ImageDigest,
        pub_key: &ImageLmsPublicKey,
        sig: &ImageLmsSignature,
    ) -> anyhow::Result<bool>;

    /// Read ECC-384 Public Key from PEM file
    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey>;

    /// Read ECC-384 Private Key from PEM file
    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey>;
}

/// An input file is absent. Nothing gets written when this happens.
#[derive(Debug, Error)]
#[error("cannot find {kind} binary {}", .path.display())]
pub struct MissingInput {
    pub kind: &'static str,
    pub path: PathBuf,
}

/// Raw binary read from disk
#[derive(Debug, Default, Clone)]
pub struct FirmwareBinary {
    path: PathBuf,
    content: Vec<u8>,
}

impl FirmwareBinary {
    /// Read `path`; `kind` names the binary in error messages
    pub fn open(kind: &'static str, path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(MissingInput {
                kind,
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read {kind} binary {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn from_bytes(content: Vec<u8>) -> Self {
        Self {
            path: PathBuf::new(),
            content,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Auxiliary binary and the descriptor type it is filed under
#[derive(Debug, Clone)]
pub struct PrebuiltBinary {
    pub r#type: PrebuiltType,

    pub binary: FirmwareBinary,
}

/// ECC signing key and the index hint stored in the header
#[derive(Debug, Clone)]
pub struct EccSigningConfig {
    pub key_idx: u32,

    pub priv_key: ImageEccPrivKey,
}

/// LMS signing key and the index hint stored in the header
#[derive(Debug, Clone)]
pub struct LmsSigningConfig {
    pub key_idx: u32,

    pub priv_key: ImageLmsPrivKey,
}

/// Image Generator Configuration
#[derive(Debug, Clone)]
pub struct ImageGeneratorConfig {
    pub hdr_version: HeaderVersion,

    pub svn: u32,

    pub fmc: FirmwareBinary,

    /// Appended after the FMC in this order
    pub prebuilts: Vec<PrebuiltBinary>,

    pub ecc: Option<EccSigningConfig>,

    pub lms: Option<LmsSigningConfig>,

    /// Dump the header fields to the log
    pub verbose: bool,
}

impl Default for ImageGeneratorConfig {
    fn default() -> Self {
        Self {
            hdr_version: HeaderVersion::V2,
            svn: 0,
            fmc: FirmwareBinary::default(),
            prebuilts: Vec::new(),
            ecc: None,
            lms: None,
            verbose: false,
        }
    }
}
