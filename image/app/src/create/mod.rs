/*++

Licensed under the Apache-2.0 license.

File Name:

   mod.rs

Abstract:

    File contains implementation FMC Image creation command.

--*/

mod config;

use anyhow::{bail, Context};
use clap::ArgMatches;
use fmc_image_crypto::{get_lms_height, lms_priv_key_from_file, lms_priv_key_to_file};
use fmc_image_gen::*;
use fmc_image_serde::ImageBundleWriter;
use fmc_image_types::*;
use std::path::{Path, PathBuf};

use crate::Crypto;

/// Options of the create command
#[derive(Debug, Clone)]
pub(crate) struct CreateArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub hdr_version: HeaderVersion,
    pub svn: u32,
    pub prebuilt_dir: PathBuf,
    pub prebuilt_config: Option<PathBuf>,
    pub ecc_key: Option<PathBuf>,
    pub ecc_key_idx: u32,
    pub lms_key: Option<PathBuf>,
    pub lms_key_idx: u32,
    pub verbose: bool,
}

impl CreateArgs {
    fn from_matches(args: &ArgMatches) -> anyhow::Result<Self> {
        let input: &PathBuf = args
            .get_one::<PathBuf>("input")
            .with_context(|| "input arg not specified")?;

        let output: &PathBuf = args
            .get_one::<PathBuf>("output")
            .with_context(|| "output arg not specified")?;

        let hdr_version: &u32 = args
            .get_one::<u32>("hdr-version")
            .with_context(|| "hdr-version arg not specified")?;

        let svn: &u32 = args
            .get_one::<u32>("svn")
            .with_context(|| "svn arg not specified")?;

        let prebuilt_dir: &PathBuf = args
            .get_one::<PathBuf>("prebuilt-dir")
            .with_context(|| "prebuilt-dir arg not specified")?;

        let ecc_key_idx: &u32 = args
            .get_one::<u32>("ecc-key-index")
            .with_context(|| "ecc-key-index arg not specified")?;

        let lms_key_idx: &u32 = args
            .get_one::<u32>("lms-key-index")
            .with_context(|| "lms-key-index arg not specified")?;

        Ok(Self {
            input: input.clone(),
            output: output.clone(),
            hdr_version: HeaderVersion::try_from(*hdr_version)?,
            svn: *svn,
            prebuilt_dir: prebuilt_dir.clone(),
            prebuilt_config: args.get_one::<PathBuf>("prebuilt-config").cloned(),
            ecc_key: args.get_one::<PathBuf>("ecc-key").cloned(),
            ecc_key_idx: *ecc_key_idx,
            lms_key: args.get_one::<PathBuf>("lms-key").cloned(),
            lms_key_idx: *lms_key_idx,
            verbose: args.get_flag("verbose"),
        })
    }
}

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    create(&CreateArgs::from_matches(args)?)
}

/// Read every input, build the image in memory, then write it out
pub(crate) fn create(args: &CreateArgs) -> anyhow::Result<()> {
    create_with(Crypto::default(), args)
}

fn create_with<C: ImageGeneratorCrypto>(crypto: C, args: &CreateArgs) -> anyhow::Result<()> {
    let fmc = FirmwareBinary::open("FMC", &args.input)?;
    let prebuilts = read_prebuilts(&args.prebuilt_dir, args.prebuilt_config.as_deref())?;

    let ecc = args
        .ecc_key
        .as_ref()
        .map(|path| -> anyhow::Result<EccSigningConfig> {
            Ok(EccSigningConfig {
                key_idx: args.ecc_key_idx,
                priv_key: C::ecc_priv_key_from_pem(path)?,
            })
        })
        .transpose()?;

    let lms = args
        .lms_key
        .as_ref()
        .map(|path| -> anyhow::Result<LmsSigningConfig> {
            Ok(LmsSigningConfig {
                key_idx: args.lms_key_idx,
                priv_key: load_lms_key(path)?,
            })
        })
        .transpose()?;

    let gen_config = ImageGeneratorConfig {
        hdr_version: args.hdr_version,
        svn: args.svn,
        fmc,
        prebuilts,
        ecc,
        lms,
        verbose: args.verbose,
    };

    let generator = ImageGenerator::new(crypto);
    let image = generator.generate(&gen_config)?;

    let out_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&args.output)
        .with_context(|| format!("Failed to create file {}", args.output.display()))?;

    let mut writer = ImageBundleWriter::new(out_file);
    writer.write(&image)?;

    log::info!(
        "Wrote {} ({} bytes)",
        args.output.display(),
        image.len()
    );

    // A one-time leaf must never sign twice
    if let (Some(path), Some(lms)) = (&args.lms_key, &gen_config.lms) {
        let next = ImageLmsPrivKey {
            q: lms.priv_key.q + 1,
            ..lms.priv_key
        };
        lms_priv_key_to_file(path, &next)?;
        log::info!("LMS key {} advanced to q={}", path.display(), next.q);
    }
    Ok(())
}

/// Load an LMS private key that still has an unused leaf
fn load_lms_key(path: &Path) -> anyhow::Result<ImageLmsPrivKey> {
    let priv_key = lms_priv_key_from_file(path)?;
    let leaves = 1u64 << get_lms_height(priv_key.tree_type)?;
    if u64::from(priv_key.q) >= leaves {
        bail!(
            "LMS key {} is exhausted: all {leaves} leaves are used",
            path.display()
        );
    }
    Ok(priv_key)
}

/// Read the prebuilt binaries named by the table. A missing file is fatal.
fn read_prebuilts(dir: &Path, config: Option<&Path>) -> anyhow::Result<Vec<PrebuiltBinary>> {
    let table = match config {
        Some(path) => config::load_prebuilt_table(path)?,
        None => config::default_prebuilt_table(),
    };

    table
        .into_iter()
        .map(|(file, r#type)| {
            let binary = FirmwareBinary::open("prebuilt", &dir.join(file))?;
            log::debug!("{}: {} bytes", r#type, binary.size());
            Ok(PrebuiltBinary { r#type, binary })
        })
        .collect()
}
