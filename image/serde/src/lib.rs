/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    FMC Image Bundle serialization & deserialization routines.

--*/
use anyhow::{bail, Context};
use fmc_image_types::*;
use std::io::Write;

/// Image Bundle Writer
pub struct ImageBundleWriter<W: Write> {
    writer: W,
}

impl<W: Write> ImageBundleWriter<W> {
    /// Create an instance of `ImageBundleWriter`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write Image Bundle. Parts are packed back to back.
    pub fn write(&mut self, image: &ImageBundle) -> anyhow::Result<()> {
        self.writer.write_all(&image.header)?;
        self.writer.write_all(&image.fmc)?;
        for prebuilt in &image.prebuilts {
            self.writer.write_all(prebuilt)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Split a serialized bundle into its header and payloads.
///
/// Payload boundaries come from the header sizes; trailing bytes are
/// ignored.
pub fn read_bundle(bytes: &[u8]) -> anyhow::Result<(FmcHdr, ImageBundle)> {
    let hdr = FmcHdr::parse(bytes).context("Failed to decode FMC header")?;
    let hdr_size = hdr.size();

    let slice = |name: &str, start: u64, size: u32| -> anyhow::Result<Vec<u8>> {
        let end = start + u64::from(size);
        if end > bytes.len() as u64 {
            bail!(
                "{name} spans {start}..{end} but the image is {} bytes",
                bytes.len()
            );
        }
        Ok(bytes[start as usize..end as usize].to_vec())
    };

    let fmc = slice("FMC", hdr_size as u64, hdr.image_size())?;
    let prebuilts = hdr
        .prebuilts()
        .iter()
        .zip(hdr.prebuilt_offsets())
        .map(|(entry, offset)| slice(entry.r#type.name(), offset, entry.size))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let bundle = ImageBundle {
        header: bytes[..hdr_size].to_vec(),
        fmc,
        prebuilts,
    };
    Ok((hdr, bundle))
}
