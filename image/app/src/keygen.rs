/*++

Licensed under the Apache-2.0 license.

File Name:

   keygen.rs

Abstract:

    File contains implementation of the LMS key generation command.

--*/

use anyhow::Context;
use clap::ArgMatches;
use fmc_image_crypto::{lms_priv_key_to_file, lms_pub_key_to_file};
use fmc_image_types::{LmotsAlgorithmType, LmsAlgorithmType};
use std::path::PathBuf;

use crate::Crypto;

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let tree_type: &u32 = args
        .get_one::<u32>("tree-type")
        .with_context(|| "tree-type arg not specified")?;

    let ots_type: &u32 = args
        .get_one::<u32>("ots-type")
        .with_context(|| "ots-type arg not specified")?;

    let out_priv: &PathBuf = args
        .get_one::<PathBuf>("out-priv")
        .with_context(|| "out-priv arg not specified")?;

    let out_pub: &PathBuf = args
        .get_one::<PathBuf>("out-pub")
        .with_context(|| "out-pub arg not specified")?;

    let (priv_key, pub_key) = Crypto::default().lms_keygen(
        LmsAlgorithmType(*tree_type),
        LmotsAlgorithmType(*ots_type),
    )?;

    lms_priv_key_to_file(out_priv, &priv_key)?;
    lms_pub_key_to_file(out_pub, &pub_key)?;
    log::info!(
        "Wrote LMS key pair {} / {}",
        out_priv.display(),
        out_pub.display()
    );
    Ok(())
}
