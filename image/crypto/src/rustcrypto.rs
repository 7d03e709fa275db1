/*++

Licensed under the Apache-2.0 license.

File Name:

   rustcrypto.rs

Abstract:

    Pure Rust crypto backend for the image generator.

--*/

use core::str::from_utf8;
use std::path::Path;

use anyhow::{anyhow, Context};

use fmc_image_gen::ImageGeneratorCrypto;
use fmc_image_types::*;

use {
    p384::{
        ecdsa::{
            signature::{Signer, Verifier},
            Signature, SigningKey, VerifyingKey,
        },
        elliptic_curve::sec1::ToEncodedPoint,
        pkcs8::{DecodePrivateKey, DecodePublicKey},
        PublicKey, SecretKey,
    },
    rand::{rngs::OsRng, RngCore},
    sha2::{Digest, Sha256, Sha384},
};

use crate::{lms_key_pair, sign_with_lms_key, verify_lms_signature, Sha256Hasher};

#[derive(Default)]
pub struct RustCrypto {}

impl RustCrypto {
    /// Fresh LMS key pair from the OS RNG
    pub fn lms_keygen(
        &self,
        tree_type: LmsAlgorithmType,
        otstype: LmotsAlgorithmType,
    ) -> anyhow::Result<(ImageLmsPrivKey, ImageLmsPublicKey)> {
        let mut id = LmsIdentifier::default();
        let mut seed = LmsHash::default();
        OsRng.fill_bytes(&mut id);
        OsRng.fill_bytes(&mut seed);
        lms_key_pair::<RustCryptoHasher>(tree_type, otstype, id, seed)
    }
}

impl ImageGeneratorCrypto for RustCrypto {
    fn sha384_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest> {
        let mut engine = Sha384::new();
        engine.update(data);
        let mut digest = [0u8; SHA384_DIGEST_BYTE_SIZE];
        digest.copy_from_slice(&engine.finalize());
        Ok(digest)
    }

    fn ecdsa384_sign(
        &self,
        data: &[u8],
        priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature> {
        let sig: Signature = SigningKey::from_slice(priv_key)?.try_sign(data)?;
        let (r, s) = sig.split_bytes();

        let mut image_sig = ImageEccSignature::default();
        image_sig.r.copy_from_slice(&r);
        image_sig.s.copy_from_slice(&s);
        Ok(image_sig)
    }

    fn ecdsa384_verify(
        &self,
        data: &[u8],
        pub_key: &ImageEccPubKey,
        sig: &ImageEccSignature,
    ) -> anyhow::Result<bool> {
        let mut point = Vec::with_capacity(1 + 2 * ECC384_SCALAR_BYTE_SIZE);
        point.push(0x04);
        point.extend_from_slice(&pub_key.x);
        point.extend_from_slice(&pub_key.y);
        let verifying_key = VerifyingKey::from_sec1_bytes(&point)?;

        let mut sig_bytes = [0u8; ECC384_SIG_BYTE_SIZE];
        sig_bytes[..ECC384_SCALAR_BYTE_SIZE].copy_from_slice(&sig.r);
        sig_bytes[ECC384_SCALAR_BYTE_SIZE..].copy_from_slice(&sig.s);
        let Ok(sig) = Signature::from_slice(&sig_bytes) else {
            return Ok(false);
        };

        Ok(verifying_key.verify(data, &sig).is_ok())
    }

    fn lms_sign(
        &self,
        digest: &ImageDigest,
        priv_key: &ImageLmsPrivKey,
    ) -> anyhow::Result<ImageLmsSignature> {
        let mut nonce = LmsHash::default();
        OsRng.fill_bytes(&mut nonce);
        sign_with_lms_key::<RustCryptoHasher>(priv_key, digest, &nonce, priv_key.q)
    }

    fn lms_verify(
        &self,
        digest: &ImageDigest,
        pub_key: &ImageLmsPublicKey,
        sig: &ImageLmsSignature,
    ) -> anyhow::Result<bool> {
        verify_lms_signature::<RustCryptoHasher>(digest, pub_key, sig)
    }

    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey> {
        let key_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read public key PEM file {}", path.display()))?;

        let pub_key =
            PublicKey::from_public_key_pem(from_utf8(&key_bytes)?)?.to_encoded_point(false);

        let x = pub_key.x().ok_or(anyhow!("Error parsing x coordinate"))?;
        let y = pub_key.y().ok_or(anyhow!("Error parsing y coordinate"))?;

        let mut image_key = ImageEccPubKey::default();
        image_key.x.copy_from_slice(x);
        image_key.y.copy_from_slice(y);
        Ok(image_key)
    }

    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey> {
        let key_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;
        let pem = from_utf8(&key_bytes)?;

        // PKCS#8 first, then the SEC1 "EC PRIVATE KEY" form
        let priv_key = match SecretKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(_) => SecretKey::from_sec1_pem(pem)
                .with_context(|| format!("Invalid P-384 private key {}", path.display()))?,
        };

        let mut image_key = [0u8; ECC384_SCALAR_BYTE_SIZE];
        image_key.copy_from_slice(&priv_key.to_bytes());
        Ok(image_key)
    }
}

pub struct RustCryptoHasher(Sha256);

impl Sha256Hasher for RustCryptoHasher {
    fn new() -> Self {
        Self(Sha256::new())
    }
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes)
    }
    fn finish(self) -> [u8; 32] {
        self.0.finalize().into()
    }
}
