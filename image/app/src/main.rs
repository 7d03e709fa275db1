/*++

Licensed under the Apache-2.0 license.

File Name:

   main.rs

Abstract:

    Main entry point FMC Imaging application

--*/
use std::path::PathBuf;

use clap::{arg, value_parser, Command};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod create;
mod inspect;
mod keygen;

#[cfg(feature = "openssl")]
pub(crate) type Crypto = fmc_image_crypto::OsslCrypto;
#[cfg(not(feature = "openssl"))]
pub(crate) type Crypto = fmc_image_crypto::RustCrypto;

fn create_cmd() -> Command {
    Command::new("create")
        .about("Prepend an FMC header to a raw FMC binary and append the prebuilt binaries")
        .arg(
            arg!(--"input" <FILE> "Input FMC raw binary")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"output" <FILE> "Output FMC binary with header")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"hdr-version" <U32> "Header version")
                .required(false)
                .default_value("2")
                .value_parser(value_parser!(u32).range(1..=2)),
        )
        .arg(
            arg!(--"svn" <U32> "FMC Security Version Number")
                .required(false)
                .default_value("0")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"prebuilt-dir" <DIR> "Directory holding the prebuilt binaries")
                .required(false)
                .default_value("prebuilt")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"prebuilt-config" <FILE> "Prebuilt binary table (TOML)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"ecc-key" <FILE> "ECDSA384 signing key (PEM)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"ecc-key-index" <U32> "ECDSA384 signing key index hint")
                .required(false)
                .default_value("0")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"lms-key" <FILE> "LMS signing key (TOML)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"lms-key-index" <U32> "LMS signing key index hint")
                .required(false)
                .default_value("0")
                .value_parser(value_parser!(u32)),
        )
        .arg(arg!(--"verbose" "Show header details"))
}

fn inspect_cmd() -> Command {
    Command::new("inspect")
        .about("Decode the header of an FMC image and check its signatures")
        .arg(
            arg!(--"input" <FILE> "FMC binary with header")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"ecc-pub-key" <FILE> "ECDSA384 public key (PEM)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"lms-pub-key" <FILE> "LMS public key (TOML)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
}

fn lms_keygen_cmd() -> Command {
    Command::new("lms-keygen")
        .about("Generate an LMS key pair")
        .arg(
            arg!(--"tree-type" <U32> "LMS algorithm type")
                .required(false)
                .default_value("12")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"ots-type" <U32> "LMOTS algorithm type")
                .required(false)
                .default_value("7")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"out-priv" <FILE> "Private key output")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"out-pub" <FILE> "Public key output")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Entry point
fn main() {
    let cmd = Command::new("fmc-image")
        .arg_required_else_help(true)
        .subcommands([create_cmd(), inspect_cmd(), lms_keygen_cmd()])
        .about("FMC firmware imaging tools")
        .get_matches();

    let Some((name, args)) = cmd.subcommand() else {
        unreachable!()
    };

    // inspect reports through the log, so it always runs at Info
    let verbose = name == "inspect" || (name == "create" && args.get_flag("verbose"));
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let _ = SimpleLogger::new().with_level(level).init();

    let result = match name {
        "create" => create::run_cmd(args),
        "inspect" => inspect::run_cmd(args),
        "lms-keygen" => keygen::run_cmd(args),
        _ => unreachable!(),
    };

    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
