/*++

Licensed under the Apache-2.0 license.

File Name:

   signing.rs

Abstract:

    Header signing. The V2 body is the signed range; the signer output is
    folded back into the fixed-width preamble slots.

--*/

use anyhow::bail;
use fmc_image_types::*;

use crate::{EccSigningConfig, ImageGeneratorCrypto, LmsSigningConfig};

/// Winternitz chain count of LMOTS_SHA256_N24_W4
pub const LMOTS_N24_W4_P: usize = 51;
/// Tree height of LMS_SHA256_N24_H15
pub const LMS_N24_H15_HEIGHT: usize = 15;

const U32_SIZE: usize = core::mem::size_of::<u32>();

/// Flatten a structured LMS signature into the byte order the header slot
/// expects: `q || ots_type || C || y[0..p] || tree_type || path[0..h]`.
///
/// The integer fields are little-endian.
pub fn flatten_lms_signature(sig: &ImageLmsSignature) -> Vec<u8> {
    let mut flat = Vec::with_capacity(
        3 * U32_SIZE
            + SHA192_DIGEST_BYTE_SIZE
                * (1 + sig.ots_sig.sig.len() + sig.tree_path.len()),
    );
    flat.extend_from_slice(&sig.q.to_le_bytes());
    flat.extend_from_slice(&sig.ots_sig.ots_type.0.to_le_bytes());
    flat.extend_from_slice(&sig.ots_sig.random);
    for y in &sig.ots_sig.sig {
        flat.extend_from_slice(y);
    }
    flat.extend_from_slice(&sig.tree_type.0.to_le_bytes());
    for node in &sig.tree_path {
        flat.extend_from_slice(node);
    }
    flat
}

/// Forward-only reader over a buffer whose length was checked up front
struct SliceReader<'a>(&'a [u8]);

impl SliceReader<'_> {
    fn take(&mut self, len: usize) -> &[u8] {
        let (head, tail) = self.0.split_at(len);
        self.0 = tail;
        head
    }

    fn u32(&mut self) -> u32 {
        let mut word = [0u8; U32_SIZE];
        word.copy_from_slice(self.take(U32_SIZE));
        u32::from_le_bytes(word)
    }

    fn hash(&mut self) -> LmsHash {
        let mut hash = LmsHash::default();
        hash.copy_from_slice(self.take(SHA192_DIGEST_BYTE_SIZE));
        hash
    }
}

/// Inverse of [`flatten_lms_signature`] for the N24/W4/H15 slot layout
pub fn lms_signature_from_bytes(bytes: &[u8]) -> anyhow::Result<ImageLmsSignature> {
    if bytes.len() < LMS_SIG_BYTE_SIZE {
        bail!(
            "LMS signature length={}, expected {}",
            bytes.len(),
            LMS_SIG_BYTE_SIZE
        );
    }

    let mut reader = SliceReader(&bytes[..LMS_SIG_BYTE_SIZE]);
    let q = reader.u32();
    let ots_type = LmotsAlgorithmType(reader.u32());
    let random = reader.hash();
    let sig = (0..LMOTS_N24_W4_P).map(|_| reader.hash()).collect();
    let tree_type = LmsAlgorithmType(reader.u32());
    let tree_path = (0..LMS_N24_H15_HEIGHT).map(|_| reader.hash()).collect();

    Ok(ImageLmsSignature {
        q,
        ots_sig: ImageLmOtsSignature {
            ots_type,
            random,
            sig,
        },
        tree_type,
        tree_path,
    })
}

/// Set the key index hints and sign the header with every key supplied.
///
/// Both indices are committed before any signature is computed so the
/// header is final apart from its signature slots. On error `hdr` is left
/// as it was.
pub fn sign_header<Crypto: ImageGeneratorCrypto>(
    crypto: &Crypto,
    hdr: &mut FmcHdrV2,
    ecc: Option<&EccSigningConfig>,
    lms: Option<&LmsSigningConfig>,
) -> anyhow::Result<()> {
    let mut signed = hdr.clone();
    if let Some(ecc) = ecc {
        signed.set_ecc_key_index(ecc.key_idx)?;
    }
    if let Some(lms) = lms {
        signed.set_lms_key_index(lms.key_idx)?;
    }

    if let Some(ecc) = ecc {
        sign_ecc(crypto, &mut signed, &ecc.priv_key)?;
    }
    if let Some(lms) = lms {
        sign_lms(crypto, &mut signed, &lms.priv_key)?;
    }

    *hdr = signed;
    Ok(())
}

/// ECDSA-384 over the body bytes
pub fn sign_ecc<Crypto: ImageGeneratorCrypto>(
    crypto: &Crypto,
    hdr: &mut FmcHdrV2,
    priv_key: &ImageEccPrivKey,
) -> anyhow::Result<()> {
    let body = hdr.emit_body(false)?;
    let sig = crypto.ecdsa384_sign(&body, priv_key)?;
    log::debug!("ECC signature over {} body bytes", body.len());
    hdr.set_ecc_signature(&sig.r, &sig.s)?;
    Ok(())
}

/// LMS over SHA2-384 of the body bytes
pub fn sign_lms<Crypto: ImageGeneratorCrypto>(
    crypto: &Crypto,
    hdr: &mut FmcHdrV2,
    priv_key: &ImageLmsPrivKey,
) -> anyhow::Result<()> {
    let body = hdr.emit_body(false)?;
    let digest = crypto.sha384_digest(&body)?;
    let sig = crypto.lms_sign(&digest, priv_key)?;
    log::debug!("LMS signature with leaf q={}", sig.q);

    // Only the N24/W4/H15 signature fills the slot exactly
    let flat = flatten_lms_signature(&sig);
    if flat.len() != LMS_SIG_BYTE_SIZE {
        bail!(
            "LMS signature of {} bytes does not fit the {} byte header slot",
            flat.len(),
            LMS_SIG_BYTE_SIZE
        );
    }
    hdr.set_lms_signature(&flat)?;
    Ok(())
}

/// Check the ECC slot against `body`, the signed range as stored in the
/// image. `None` when the slot is empty.
pub fn verify_ecc<Crypto: ImageGeneratorCrypto>(
    crypto: &Crypto,
    hdr: &FmcHdrV2,
    body: &[u8],
    pub_key: &ImageEccPubKey,
) -> anyhow::Result<Option<bool>> {
    if !hdr.is_ecc_signed() {
        return Ok(None);
    }
    let (r, s) = hdr.ecc_signature().split_at(ECC384_SCALAR_BYTE_SIZE);
    let mut sig = ImageEccSignature::default();
    sig.r.copy_from_slice(r);
    sig.s.copy_from_slice(s);

    crypto.ecdsa384_verify(body, pub_key, &sig).map(Some)
}

/// Check the LMS slot against `body`, the signed range as stored in the
/// image. `None` when the slot is empty.
pub fn verify_lms<Crypto: ImageGeneratorCrypto>(
    crypto: &Crypto,
    hdr: &FmcHdrV2,
    body: &[u8],
    pub_key: &ImageLmsPublicKey,
) -> anyhow::Result<Option<bool>> {
    if !hdr.is_lms_signed() {
        return Ok(None);
    }
    let sig = lms_signature_from_bytes(&hdr.lms_signature()[..])?;
    let digest = crypto.sha384_digest(body)?;
    crypto.lms_verify(&digest, pub_key, &sig).map(Some)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    /// Deterministic stand-in for a real crypto provider
    #[derive(Default)]
    pub(crate) struct FakeCrypto;

    impl FakeCrypto {
        fn fold(data: &[u8]) -> ImageDigest {
            let mut out = [0u8; SHA384_DIGEST_BYTE_SIZE];
            for (i, b) in data.iter().enumerate() {
                out[i % SHA384_DIGEST_BYTE_SIZE] ^= b.rotate_left(i as u32 % 8);
            }
            out[0] ^= data.len() as u8;
            out
        }
    }

    impl ImageGeneratorCrypto for FakeCrypto {
        fn sha384_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest> {
            Ok(Self::fold(data))
        }

        fn ecdsa384_sign(
            &self,
            data: &[u8],
            priv_key: &ImageEccPrivKey,
        ) -> anyhow::Result<ImageEccSignature> {
            let r = Self::fold(data);
            let mut s = r;
            s.iter_mut().zip(priv_key).for_each(|(a, b)| *a ^= b);
            Ok(ImageEccSignature { r, s })
        }

        fn ecdsa384_verify(
            &self,
            data: &[u8],
            pub_key: &ImageEccPubKey,
            sig: &ImageEccSignature,
        ) -> anyhow::Result<bool> {
            Ok(self.ecdsa384_sign(data, &pub_key.x)? == *sig)
        }

        fn lms_sign(
            &self,
            digest: &ImageDigest,
            priv_key: &ImageLmsPrivKey,
        ) -> anyhow::Result<ImageLmsSignature> {
            let mut random = LmsHash::default();
            random.copy_from_slice(&digest[..SHA192_DIGEST_BYTE_SIZE]);
            Ok(ImageLmsSignature {
                q: priv_key.q,
                ots_sig: ImageLmOtsSignature {
                    ots_type: LmotsAlgorithmType::LmotsSha256N24W4,
                    random,
                    sig: (0..LMOTS_N24_W4_P as u8).map(|i| [i; 24]).collect(),
                },
                tree_type: LmsAlgorithmType::LmsSha256N24H15,
                tree_path: (0..LMS_N24_H15_HEIGHT as u8)
                    .map(|i| [0x80 | i; 24])
                    .collect(),
            })
        }

        fn lms_verify(
            &self,
            digest: &ImageDigest,
            pub_key: &ImageLmsPublicKey,
            sig: &ImageLmsSignature,
        ) -> anyhow::Result<bool> {
            Ok(sig.ots_sig.random[..] == digest[..SHA192_DIGEST_BYTE_SIZE]
                && sig.tree_type == pub_key.tree_type)
        }

        fn ecc_pub_key_from_pem(_path: &Path) -> anyhow::Result<ImageEccPubKey> {
            unimplemented!()
        }

        fn ecc_priv_key_from_pem(_path: &Path) -> anyhow::Result<ImageEccPrivKey> {
            unimplemented!()
        }
    }

    fn sample_hdr() -> FmcHdrV2 {
        let mut hdr = FmcHdrV2::new();
        hdr.set_image_size(1000).unwrap();
        hdr.set_image_digest(&[0xd0; 48]).unwrap();
        hdr.add_prebuilt(PrebuiltType::DpFw.into(), 200, &[0xe1; 48])
            .unwrap();
        hdr
    }

    #[test]
    fn test_flatten_order() {
        let priv_key = ImageLmsPrivKey {
            q: 0x0102_0304,
            ..Default::default()
        };
        let sig = FakeCrypto.lms_sign(&[0x33; 48], &priv_key).unwrap();
        let flat = flatten_lms_signature(&sig);

        assert_eq!(flat.len(), LMS_SIG_BYTE_SIZE);
        assert_eq!(&flat[0..4], &[0x04u8, 0x03, 0x02, 0x01]);
        assert_eq!(&flat[4..8], &7u32.to_le_bytes());
        assert_eq!(&flat[8..32], &[0x33u8; 24]);
        assert_eq!(&flat[32..56], &[0u8; 24]);
        assert_eq!(&flat[32 + 50 * 24..32 + 51 * 24], &[50u8; 24]);
        assert_eq!(&flat[1256..1260], &12u32.to_le_bytes());
        assert_eq!(&flat[1260..1284], &[0x80u8; 24]);
        assert_eq!(&flat[1596..1620], &[0x8eu8; 24]);

        assert_eq!(lms_signature_from_bytes(&flat).unwrap(), sig);
        assert!(lms_signature_from_bytes(&flat[..1619]).is_err());
    }

    #[test]
    fn test_sign_header_fills_slots_only() {
        let mut hdr = sample_hdr();
        let body = hdr.emit_body(false).unwrap();

        let ecc = EccSigningConfig {
            key_idx: 4,
            priv_key: [0x42; 48],
        };
        let lms = LmsSigningConfig {
            key_idx: 9,
            priv_key: ImageLmsPrivKey::default(),
        };
        sign_header(&FakeCrypto, &mut hdr, Some(&ecc), Some(&lms)).unwrap();

        assert_eq!(hdr.ecc_key_index(), 4);
        assert_eq!(hdr.lms_key_index(), 9);
        assert!(hdr.is_ecc_signed());
        assert!(hdr.is_lms_signed());
        assert_eq!(hdr.emit_body(false).unwrap(), body);

        let expected = FakeCrypto.ecdsa384_sign(&body, &ecc.priv_key).unwrap();
        assert_eq!(&hdr.ecc_signature()[..48], &expected.r);
        assert_eq!(&hdr.ecc_signature()[48..], &expected.s);

        let digest = FakeCrypto.sha384_digest(&body).unwrap();
        assert_eq!(&hdr.lms_signature()[8..32], &digest[..24]);

        let pub_key = ImageEccPubKey {
            x: [0x42; 48],
            y: [0; 48],
        };
        assert_eq!(
            verify_ecc(&FakeCrypto, &hdr, &body, &pub_key).unwrap(),
            Some(true)
        );
        let lms_pub = ImageLmsPublicKey {
            tree_type: LmsAlgorithmType::LmsSha256N24H15,
            ..Default::default()
        };
        assert_eq!(
            verify_lms(&FakeCrypto, &hdr, &body, &lms_pub).unwrap(),
            Some(true)
        );

        // Any change inside the signed range fails both schemes
        let mut tampered = body.clone();
        tampered[0] ^= 0x01;
        assert_eq!(
            verify_ecc(&FakeCrypto, &hdr, &tampered, &pub_key).unwrap(),
            Some(false)
        );
        assert_eq!(
            verify_lms(&FakeCrypto, &hdr, &tampered, &lms_pub).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_schemes_are_independent() {
        let mut hdr = sample_hdr();
        let ecc = EccSigningConfig {
            key_idx: 1,
            priv_key: [0x42; 48],
        };
        sign_header(&FakeCrypto, &mut hdr, Some(&ecc), None).unwrap();
        assert!(hdr.is_ecc_signed());
        assert!(!hdr.is_lms_signed());
        assert_eq!(hdr.lms_key_index(), 0);
        let body = hdr.emit_body(false).unwrap();
        let lms_pub = ImageLmsPublicKey::default();
        assert_eq!(verify_lms(&FakeCrypto, &hdr, &body, &lms_pub).unwrap(), None);
    }

    #[test]
    fn test_invalid_key_index_signs_nothing() {
        let mut hdr = sample_hdr();
        let ecc = EccSigningConfig {
            key_idx: 16,
            priv_key: [0x42; 48],
        };
        assert!(sign_header(&FakeCrypto, &mut hdr, Some(&ecc), None).is_err());
        assert!(!hdr.is_ecc_signed());
    }

    #[test]
    fn test_invalid_lms_index_leaves_header_untouched() {
        let mut hdr = sample_hdr();
        let before = hdr.clone();
        let ecc = EccSigningConfig {
            key_idx: 5,
            priv_key: [0x42; 48],
        };
        let lms = LmsSigningConfig {
            key_idx: 16,
            priv_key: ImageLmsPrivKey::default(),
        };
        assert!(sign_header(&FakeCrypto, &mut hdr, Some(&ecc), Some(&lms)).is_err());
        assert_eq!(hdr, before);
        assert_eq!(hdr.ecc_key_index(), 0);
    }
}
