/*++

Licensed under the Apache-2.0 license.

File Name:

   inspect.rs

Abstract:

    File contains implementation of the FMC image inspection command.

--*/

use anyhow::{bail, Context};
use clap::ArgMatches;
use fmc_image_crypto::lms_pub_key_from_file;
use fmc_image_gen::{signing, ImageGeneratorCrypto};
use fmc_image_serde::read_bundle;
use fmc_image_types::*;
use std::path::{Path, PathBuf};

use crate::Crypto;

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let input: &PathBuf = args
        .get_one::<PathBuf>("input")
        .with_context(|| "input arg not specified")?;

    inspect(
        input,
        args.get_one::<PathBuf>("ecc-pub-key").map(PathBuf::as_path),
        args.get_one::<PathBuf>("lms-pub-key").map(PathBuf::as_path),
    )
}

fn signature_status(status: Option<bool>) -> &'static str {
    match status {
        None => "unsigned",
        Some(true) => "valid",
        Some(false) => "INVALID",
    }
}

pub(crate) fn inspect(
    input: &Path,
    ecc_pub_key: Option<&Path>,
    lms_pub_key: Option<&Path>,
) -> anyhow::Result<()> {
    let image = std::fs::read(input)
        .with_context(|| format!("Failed to read image {}", input.display()))?;
    let (hdr, bundle) = read_bundle(&image)?;

    hdr.emit_full(true)?;
    for (entry, offset) in hdr.prebuilts().iter().zip(hdr.prebuilt_offsets()) {
        log::info!("{:<25}: offset {offset:#x}", entry.r#type.name());
    }

    let FmcHdr::V2(hdr) = hdr else {
        if ecc_pub_key.is_some() || lms_pub_key.is_some() {
            bail!("Header version 1 carries no signatures");
        }
        return Ok(());
    };

    let crypto = Crypto::default();
    if crypto.sha384_digest(&bundle.fmc)? != *hdr.image_digest() {
        bail!("FMC digest mismatch");
    }
    for (entry, binary) in hdr.prebuilts().iter().zip(&bundle.prebuilts) {
        if Some(crypto.sha384_digest(binary)?) != entry.digest {
            bail!("{} digest mismatch", entry.r#type);
        }
    }
    log::info!("Digests                  : valid");

    // Signatures cover the body bytes as stored, not a re-encoding
    let body = &bundle.header[FmcHdrV2::body_range()];
    let mut failed = false;
    if let Some(path) = ecc_pub_key {
        let pub_key = Crypto::ecc_pub_key_from_pem(path)?;
        let status = signing::verify_ecc(&crypto, &hdr, body, &pub_key)?;
        log::info!("ECC signature            : {}", signature_status(status));
        failed |= status == Some(false);
    }
    if let Some(path) = lms_pub_key {
        let pub_key = lms_pub_key_from_file(path)?;
        let status = signing::verify_lms(&crypto, &hdr, body, &pub_key)?;
        log::info!("LMS signature            : {}", signature_status(status));
        failed |= status == Some(false);
    }

    if failed {
        bail!("Signature verification failed for {}", input.display());
    }
    Ok(())
}
