/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains crypto utilities needed to generate and inspect images.

--*/

mod lms;
#[cfg(feature = "openssl")]
mod openssl;
#[cfg(feature = "rustcrypto")]
mod rustcrypto;

use std::path::Path;

use anyhow::{anyhow, Context};
use fmc_image_types::*;
use serde_derive::{Deserialize, Serialize};

pub use lms::{
    generate_lms_pubkey, get_lmots_parameters, get_lms_height, sign_with_lms_key,
    verify_lms_signature, LmotsParameter,
};
#[cfg(feature = "openssl")]
pub use crate::openssl::{OpensslHasher, OsslCrypto};
#[cfg(feature = "rustcrypto")]
pub use rustcrypto::{RustCrypto, RustCryptoHasher};

/// Backend-neutral SHA-256 used by the LMS code
pub trait Sha256Hasher: Sized {
    fn new() -> Self;
    fn update(&mut self, bytes: &[u8]);
    fn finish(self) -> [u8; 32];
}

/// On-disk form of an LMS private key
#[derive(Debug, Serialize, Deserialize)]
struct LmsPrivKeyFile {
    tree_type: u32,
    otstype: u32,
    id: String,
    seed: String,
    /// Leaf used for the next signature
    q: u32,
}

/// On-disk form of an LMS public key
#[derive(Debug, Serialize, Deserialize)]
struct LmsPubKeyFile {
    tree_type: u32,
    otstype: u32,
    id: String,
    digest: String,
}

fn hex_field<const N: usize>(name: &str, value: &str) -> anyhow::Result<[u8; N]> {
    let bytes = hex::decode(value).with_context(|| format!("Invalid hex in field {name}"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("Field {name} has {len} bytes, expected {N}"))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse key file {}", path.display()))
}

fn write_toml<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = toml::to_string(value)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write key file {}", path.display()))
}

/// Read LMS Private Key from TOML file
pub fn lms_priv_key_from_file(path: &Path) -> anyhow::Result<ImageLmsPrivKey> {
    let file: LmsPrivKeyFile = read_toml(path)?;
    Ok(ImageLmsPrivKey {
        tree_type: LmsAlgorithmType(file.tree_type),
        otstype: LmotsAlgorithmType(file.otstype),
        id: hex_field("id", &file.id)?,
        seed: hex_field("seed", &file.seed)?,
        q: file.q,
    })
}

/// Read LMS Public Key from TOML file
pub fn lms_pub_key_from_file(path: &Path) -> anyhow::Result<ImageLmsPublicKey> {
    let file: LmsPubKeyFile = read_toml(path)?;
    Ok(ImageLmsPublicKey {
        tree_type: LmsAlgorithmType(file.tree_type),
        otstype: LmotsAlgorithmType(file.otstype),
        id: hex_field("id", &file.id)?,
        digest: hex_field("digest", &file.digest)?,
    })
}

pub fn lms_priv_key_to_file(path: &Path, key: &ImageLmsPrivKey) -> anyhow::Result<()> {
    write_toml(
        path,
        &LmsPrivKeyFile {
            tree_type: key.tree_type.0,
            otstype: key.otstype.0,
            id: hex::encode(key.id),
            seed: hex::encode(key.seed),
            q: key.q,
        },
    )
}

pub fn lms_pub_key_to_file(path: &Path, key: &ImageLmsPublicKey) -> anyhow::Result<()> {
    write_toml(
        path,
        &LmsPubKeyFile {
            tree_type: key.tree_type.0,
            otstype: key.otstype.0,
            id: hex::encode(key.id),
            digest: hex::encode(key.digest),
        },
    )
}

/// Create an LMS key pair from caller supplied randomness
pub fn lms_key_pair<H: Sha256Hasher>(
    tree_type: LmsAlgorithmType,
    otstype: LmotsAlgorithmType,
    id: LmsIdentifier,
    seed: LmsHash,
) -> anyhow::Result<(ImageLmsPrivKey, ImageLmsPublicKey)> {
    let priv_key = ImageLmsPrivKey {
        tree_type,
        otstype,
        id,
        seed,
        q: 0,
    };
    let pub_key = generate_lms_pubkey::<H>(&priv_key)?;
    Ok((priv_key, pub_key))
}
