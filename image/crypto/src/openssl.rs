/*++

Licensed under the Apache-2.0 license.

File Name:

   openssl.rs

Abstract:

    OpenSSL crypto backend for the image generator.

--*/

use std::path::Path;

use anyhow::Context;

use fmc_image_gen::ImageGeneratorCrypto;
use fmc_image_types::*;

use openssl::{
    bn::{BigNum, BigNumContext},
    ec::{EcGroup, EcKey, EcPoint},
    ecdsa::EcdsaSig,
    nid::Nid,
    rand::rand_bytes,
    sha::{Sha256, Sha384},
};

use crate::{lms_key_pair, sign_with_lms_key, verify_lms_signature, Sha256Hasher};

#[derive(Default)]
pub struct OsslCrypto {}

impl OsslCrypto {
    /// Fresh LMS key pair from the OpenSSL RNG
    pub fn lms_keygen(
        &self,
        tree_type: LmsAlgorithmType,
        otstype: LmotsAlgorithmType,
    ) -> anyhow::Result<(ImageLmsPrivKey, ImageLmsPublicKey)> {
        let mut id = LmsIdentifier::default();
        let mut seed = LmsHash::default();
        rand_bytes(&mut id)?;
        rand_bytes(&mut seed)?;
        lms_key_pair::<OpensslHasher>(tree_type, otstype, id, seed)
    }
}

fn to_scalar(bytes: &[u8]) -> anyhow::Result<ImageScalar> {
    let mut scalar = [0u8; ECC384_SCALAR_BYTE_SIZE];
    scalar.copy_from_slice(bytes);
    Ok(scalar)
}

impl ImageGeneratorCrypto for OsslCrypto {
    fn sha384_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest> {
        let mut engine = Sha384::new();
        engine.update(data);
        Ok(engine.finish())
    }

    fn ecdsa384_sign(
        &self,
        data: &[u8],
        priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature> {
        let digest = self.sha384_digest(data)?;

        let group = EcGroup::from_curve_name(Nid::SECP384R1)?;
        let ctx = BigNumContext::new()?;
        let priv_key = BigNum::from_slice(priv_key)?;

        let mut pub_key = EcPoint::new(&group)?;
        pub_key.mul_generator(&group, &priv_key, &ctx)?;

        let ec_key = EcKey::from_private_components(&group, &priv_key, &pub_key)?;
        let sig = EcdsaSig::sign(&digest, &ec_key)?;

        let r = sig.r().to_vec_padded(ECC384_SCALAR_BYTE_SIZE as i32)?;
        let s = sig.s().to_vec_padded(ECC384_SCALAR_BYTE_SIZE as i32)?;

        Ok(ImageEccSignature {
            r: to_scalar(&r)?,
            s: to_scalar(&s)?,
        })
    }

    fn ecdsa384_verify(
        &self,
        data: &[u8],
        pub_key: &ImageEccPubKey,
        sig: &ImageEccSignature,
    ) -> anyhow::Result<bool> {
        let digest = self.sha384_digest(data)?;

        let group = EcGroup::from_curve_name(Nid::SECP384R1)?;
        let mut ctx = BigNumContext::new()?;
        let x = BigNum::from_slice(&pub_key.x)?;
        let y = BigNum::from_slice(&pub_key.y)?;
        let mut point = EcPoint::new(&group)?;
        point.set_affine_coordinates_gfp(&group, &x, &y, &mut ctx)?;
        let ec_key = EcKey::from_public_key(&group, &point)?;

        let sig = EcdsaSig::from_private_components(
            BigNum::from_slice(&sig.r)?,
            BigNum::from_slice(&sig.s)?,
        )?;
        Ok(sig.verify(&digest, &ec_key)?)
    }

    fn lms_sign(
        &self,
        digest: &ImageDigest,
        priv_key: &ImageLmsPrivKey,
    ) -> anyhow::Result<ImageLmsSignature> {
        let mut nonce = LmsHash::default();
        rand_bytes(&mut nonce)?;
        sign_with_lms_key::<OpensslHasher>(priv_key, digest, &nonce, priv_key.q)
    }

    fn lms_verify(
        &self,
        digest: &ImageDigest,
        pub_key: &ImageLmsPublicKey,
        sig: &ImageLmsSignature,
    ) -> anyhow::Result<bool> {
        verify_lms_signature::<OpensslHasher>(digest, pub_key, sig)
    }

    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey> {
        let key_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read public key PEM file {}", path.display()))?;
        let key = EcKey::public_key_from_pem(&key_bytes)?;
        let group = EcGroup::from_curve_name(Nid::SECP384R1)?;
        let mut ctx = BigNumContext::new()?;
        let mut x = BigNum::new()?;
        let mut y = BigNum::new()?;

        key.public_key()
            .affine_coordinates_gfp(&group, &mut x, &mut y, &mut ctx)?;

        let x = x.to_vec_padded(ECC384_SCALAR_BYTE_SIZE as i32)?;
        let y = y.to_vec_padded(ECC384_SCALAR_BYTE_SIZE as i32)?;

        Ok(ImageEccPubKey {
            x: to_scalar(&x)?,
            y: to_scalar(&y)?,
        })
    }

    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey> {
        let key_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;

        let key = EcKey::private_key_from_pem(&key_bytes)?;

        let priv_key = key
            .private_key()
            .to_vec_padded(ECC384_SCALAR_BYTE_SIZE as i32)?;

        to_scalar(&priv_key)
    }
}

pub struct OpensslHasher(Sha256);

impl Sha256Hasher for OpensslHasher {
    fn new() -> Self {
        Self(Sha256::new())
    }
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes)
    }
    fn finish(self) -> [u8; 32] {
        self.0.finish()
    }
}
