/*++

Licensed under the Apache-2.0 license.

File Name:

   generator.rs

Abstract:

    FMC image generator

--*/
use anyhow::{bail, Context};
use fmc_image_types::*;

use crate::signing::sign_header;
use crate::*;

/// Image generator
pub struct ImageGenerator<Crypto: ImageGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: ImageGeneratorCrypto> ImageGenerator<Crypto> {
    /// Create an instance `ImageGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    /// Generate image
    ///
    /// # Arguments
    ///
    /// * `config` - Image generator configuration
    ///
    /// # Returns
    ///
    /// * `ImageBundle` - Header, FMC and prebuilt binaries in file order
    pub fn generate(&self, config: &ImageGeneratorConfig) -> anyhow::Result<ImageBundle> {
        let header = match config.hdr_version {
            HeaderVersion::V1 => self.gen_header_v1(config)?,
            HeaderVersion::V2 => self.gen_header_v2(config)?,
        };
        log::debug!(
            "Generated {:?} header of {} bytes",
            config.hdr_version,
            header.len()
        );

        let bundle = ImageBundle {
            header,
            fmc: config.fmc.content().to_vec(),
            prebuilts: config
                .prebuilts
                .iter()
                .map(|pb| pb.binary.content().to_vec())
                .collect(),
        };
        log::info!("Image bundle size: {} bytes", bundle.len());
        Ok(bundle)
    }

    fn gen_header_v1(&self, config: &ImageGeneratorConfig) -> anyhow::Result<Vec<u8>> {
        if config.ecc.is_some() || config.lms.is_some() {
            bail!("Signing keys require header version 2");
        }
        if config.svn != 0 {
            bail!("SVN requires header version 2");
        }

        let mut hdr = FmcHdrV1::new();
        hdr.set_image_size(config.fmc.size())
            .context("Invalid FMC binary")?;
        for pb in &config.prebuilts {
            hdr.add_prebuilt(pb.r#type.into(), pb.binary.size())
                .with_context(|| format!("Invalid prebuilt binary {}", pb.r#type))?;
        }

        Ok(hdr.emit_full(config.verbose)?)
    }

    fn gen_header_v2(&self, config: &ImageGeneratorConfig) -> anyhow::Result<Vec<u8>> {
        let mut hdr = FmcHdrV2::new();
        hdr.set_svn(config.svn)?;
        hdr.set_image_size(config.fmc.size())
            .context("Invalid FMC binary")?;
        hdr.set_image_digest(&self.crypto.sha384_digest(config.fmc.content())?)?;

        for pb in &config.prebuilts {
            let digest = self.crypto.sha384_digest(pb.binary.content())?;
            hdr.add_prebuilt(pb.r#type.into(), pb.binary.size(), &digest)
                .with_context(|| format!("Invalid prebuilt binary {}", pb.r#type))?;
        }

        sign_header(
            &self.crypto,
            &mut hdr,
            config.ecc.as_ref(),
            config.lms.as_ref(),
        )?;

        Ok(hdr.emit_full(config.verbose)?)
    }
}
