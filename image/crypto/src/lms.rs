/*++

Licensed under the Apache-2.0 license.

File Name:

   lms.rs

Abstract:

    SHA-256/192 LMS key generation, signing and verification.

    https://www.rfc-editor.org/rfc/rfc8554

--*/

use anyhow::{anyhow, bail};
use fmc_image_types::*;

use crate::Sha256Hasher;

const D_PBLC: u16 = 0x8080;
const D_MESG: u16 = 0x8181;
const D_LEAF: u16 = 0x8282;
const D_INTR: u16 = 0x8383;

const N: usize = SHA192_DIGEST_BYTE_SIZE;

#[derive(Debug)]
pub struct LmotsParameter {
    pub algorithm_name: LmotsAlgorithmType,
    pub w: u8,
    pub p: u16,
    pub ls: u8,
}

const LMOTS_P: [LmotsParameter; 4] = [
    LmotsParameter {
        algorithm_name: LmotsAlgorithmType::LmotsSha256N24W1,
        w: 1,
        p: 200,
        ls: 8,
    },
    LmotsParameter {
        algorithm_name: LmotsAlgorithmType::LmotsSha256N24W2,
        w: 2,
        p: 101,
        ls: 6,
    },
    LmotsParameter {
        algorithm_name: LmotsAlgorithmType::LmotsSha256N24W4,
        w: 4,
        p: 51,
        ls: 4,
    },
    LmotsParameter {
        algorithm_name: LmotsAlgorithmType::LmotsSha256N24W8,
        w: 8,
        p: 26,
        ls: 0,
    },
];

pub fn get_lmots_parameters(
    algo_type: LmotsAlgorithmType,
) -> anyhow::Result<&'static LmotsParameter> {
    LMOTS_P
        .iter()
        .find(|params| params.algorithm_name == algo_type)
        .ok_or_else(|| anyhow!("Unsupported LMOTS algorithm type {}", algo_type.0))
}

/// Tree height of a SHA-256/192 LMS parameter set
pub fn get_lms_height(algo_type: LmsAlgorithmType) -> anyhow::Result<u8> {
    match algo_type {
        LmsAlgorithmType::LmsSha256N24H5 => Ok(5),
        LmsAlgorithmType::LmsSha256N24H10 => Ok(10),
        LmsAlgorithmType::LmsSha256N24H15 => Ok(15),
        LmsAlgorithmType::LmsSha256N24H20 => Ok(20),
        LmsAlgorithmType::LmsSha256N24H25 => Ok(25),
        _ => bail!("Unsupported LMS algorithm type {}", algo_type.0),
    }
}

// https://www.rfc-editor.org/rfc/rfc8554#section-3.1.3
fn coefficient(s: &[u8], i: usize, w: usize) -> u8 {
    let mask = ((1u16 << w) - 1) as u8;
    let shift = 8 - (w * (i % (8 / w)) + w);
    mask & (s[i * w / 8] >> shift)
}

/// `Q || Cksm(Q)` for the OTS chain lengths
fn digest_with_checksum(params: &LmotsParameter, q_digest: &LmsHash) -> [u8; N + 2] {
    let w = params.w as usize;
    let max = (1u16 << w) - 1;
    let sum: u16 = (0..N * 8 / w)
        .map(|i| max - u16::from(coefficient(q_digest, i, w)))
        .sum();

    let mut out = [0u8; N + 2];
    out[..N].copy_from_slice(q_digest);
    out[N..].copy_from_slice(&(sum << params.ls).to_be_bytes());
    out
}

fn truncate(hash: [u8; 32]) -> LmsHash {
    let mut out = LmsHash::default();
    out.copy_from_slice(&hash[..N]);
    out
}

fn hash_message<H: Sha256Hasher>(
    id: &LmsIdentifier,
    q: u32,
    nonce: &LmsHash,
    message: &[u8],
) -> LmsHash {
    let mut hasher = H::new();
    hasher.update(id);
    hasher.update(&q.to_be_bytes());
    hasher.update(&D_MESG.to_be_bytes());
    hasher.update(nonce);
    hasher.update(message);
    truncate(hasher.finish())
}

/// One step along Winternitz chain `i`
fn chain_step<H: Sha256Hasher>(id: &LmsIdentifier, q: u32, i: u16, j: u8, tmp: &LmsHash) -> LmsHash {
    let mut hasher = H::new();
    hasher.update(id);
    hasher.update(&q.to_be_bytes());
    hasher.update(&i.to_be_bytes());
    hasher.update(&[j]);
    hasher.update(tmp);
    truncate(hasher.finish())
}

// https://www.rfc-editor.org/rfc/rfc8554.html#appendix-A
fn gen_x<H: Sha256Hasher>(id: &LmsIdentifier, q: u32, p: u16, seed: &LmsHash) -> Vec<LmsHash> {
    (0..p)
        .map(|i| {
            let mut hasher = H::new();
            hasher.update(id);
            hasher.update(&q.to_be_bytes());
            hasher.update(&i.to_be_bytes());
            hasher.update(&[0xff]);
            hasher.update(seed);
            truncate(hasher.finish())
        })
        .collect()
}

fn hash_ots_pubkey<H: Sha256Hasher>(id: &LmsIdentifier, q: u32, z: &[LmsHash]) -> LmsHash {
    let mut hasher = H::new();
    hasher.update(id);
    hasher.update(&q.to_be_bytes());
    hasher.update(&D_PBLC.to_be_bytes());
    for z_i in z {
        hasher.update(z_i);
    }
    truncate(hasher.finish())
}

fn gen_k<H: Sha256Hasher>(
    id: &LmsIdentifier,
    q: u32,
    params: &LmotsParameter,
    seed: &LmsHash,
) -> LmsHash {
    let chain_len = ((1u16 << params.w) - 1) as u8;
    let y: Vec<LmsHash> = gen_x::<H>(id, q, params.p, seed)
        .iter()
        .zip(0u16..)
        .map(|(x_i, i)| (0..chain_len).fold(*x_i, |tmp, j| chain_step::<H>(id, q, i, j, &tmp)))
        .collect();
    hash_ots_pubkey::<H>(id, q, &y)
}

fn hash_leaf<H: Sha256Hasher>(id: &LmsIdentifier, r: u32, k: &LmsHash) -> LmsHash {
    let mut hasher = H::new();
    hasher.update(id);
    hasher.update(&r.to_be_bytes());
    hasher.update(&D_LEAF.to_be_bytes());
    hasher.update(k);
    truncate(hasher.finish())
}

fn hash_intr<H: Sha256Hasher>(id: &LmsIdentifier, r: u32, left: &LmsHash, right: &LmsHash) -> LmsHash {
    let mut hasher = H::new();
    hasher.update(id);
    hasher.update(&r.to_be_bytes());
    hasher.update(&D_INTR.to_be_bytes());
    hasher.update(left);
    hasher.update(right);
    truncate(hasher.finish())
}

/// Walk the whole tree once. Returns the root and, when `q` is given, the
/// authentication path of leaf `q` ordered from the leaf level up.
///
/// https://datatracker.ietf.org/doc/html/rfc8554#appendix-C
fn compute_tree<H: Sha256Hasher>(
    id: &LmsIdentifier,
    params: &LmotsParameter,
    tree_height: u8,
    seed: &LmsHash,
    q: Option<u32>,
) -> (LmsHash, Vec<LmsHash>) {
    let leaves: u32 = 1 << tree_height;
    let height = tree_height as usize;
    let mut path = vec![LmsHash::default(); if q.is_some() { height } else { 0 }];
    let mut stack: Vec<LmsHash> = Vec::with_capacity(height + 1);

    // Node `r` at `level` belongs to the path when it is the sibling of the
    // signing leaf's ancestor on that level.
    let mut capture = |r: u32, level: usize, k: &LmsHash| {
        if let Some(q) = q {
            if level < height && r == ((leaves + q) >> level) ^ 1 {
                path[level] = *k;
            }
        }
    };

    for i in 0..leaves {
        let mut r = leaves + i;
        let mut level = 0;
        let mut k = hash_leaf::<H>(id, r, &gen_k::<H>(id, i, params, seed));
        capture(r, level, &k);

        let mut j = i;
        while j % 2 == 1 {
            let Some(left) = stack.pop() else {
                break;
            };
            r >>= 1;
            j >>= 1;
            level += 1;
            k = hash_intr::<H>(id, r, &left, &k);
            capture(r, level, &k);
        }
        stack.push(k);
    }

    let root = stack.pop().unwrap_or_default();
    (root, path)
}

/// Derive the public key digest (tree root) of `priv_key`
pub fn generate_lms_pubkey<H: Sha256Hasher>(
    priv_key: &ImageLmsPrivKey,
) -> anyhow::Result<ImageLmsPublicKey> {
    let params = get_lmots_parameters(priv_key.otstype)?;
    let height = get_lms_height(priv_key.tree_type)?;
    let (digest, _) = compute_tree::<H>(&priv_key.id, params, height, &priv_key.seed, None);
    Ok(ImageLmsPublicKey {
        tree_type: priv_key.tree_type,
        otstype: priv_key.otstype,
        id: priv_key.id,
        digest,
    })
}

// https://datatracker.ietf.org/doc/html/rfc8554#section-4.5
fn generate_ots_signature<H: Sha256Hasher>(
    message: &[u8],
    params: &LmotsParameter,
    id: &LmsIdentifier,
    seed: &LmsHash,
    nonce: &LmsHash,
    q: u32,
) -> ImageLmOtsSignature {
    let q_digest = hash_message::<H>(id, q, nonce, message);
    let with_cksm = digest_with_checksum(params, &q_digest);
    let w = params.w as usize;

    let sig = gen_x::<H>(id, q, params.p, seed)
        .iter()
        .zip(0u16..)
        .map(|(x_i, i)| {
            let a = coefficient(&with_cksm, i as usize, w);
            (0..a).fold(*x_i, |tmp, j| chain_step::<H>(id, q, i, j, &tmp))
        })
        .collect();

    ImageLmOtsSignature {
        ots_type: params.algorithm_name,
        random: *nonce,
        sig,
    }
}

/// Sign `message` with leaf `q` of `priv_key`
pub fn sign_with_lms_key<H: Sha256Hasher>(
    priv_key: &ImageLmsPrivKey,
    message: &[u8],
    nonce: &LmsHash,
    q: u32,
) -> anyhow::Result<ImageLmsSignature> {
    let params = get_lmots_parameters(priv_key.otstype)?;
    let height = get_lms_height(priv_key.tree_type)?;
    if u64::from(q) >= 1u64 << height {
        bail!("Invalid LMS leaf index q={q} for tree height {height}");
    }

    let ots_sig =
        generate_ots_signature::<H>(message, params, &priv_key.id, &priv_key.seed, nonce, q);
    let (_, tree_path) = compute_tree::<H>(&priv_key.id, params, height, &priv_key.seed, Some(q));

    Ok(ImageLmsSignature {
        q,
        ots_sig,
        tree_type: priv_key.tree_type,
        tree_path,
    })
}

/// Check `sig` over `message` against `pub_key`
pub fn verify_lms_signature<H: Sha256Hasher>(
    message: &[u8],
    pub_key: &ImageLmsPublicKey,
    sig: &ImageLmsSignature,
) -> anyhow::Result<bool> {
    if sig.tree_type != pub_key.tree_type || sig.ots_sig.ots_type != pub_key.otstype {
        return Ok(false);
    }
    let params = get_lmots_parameters(pub_key.otstype)?;
    let height = get_lms_height(pub_key.tree_type)?;
    if u64::from(sig.q) >= 1u64 << height
        || sig.ots_sig.sig.len() != params.p as usize
        || sig.tree_path.len() != height as usize
    {
        return Ok(false);
    }

    let id = &pub_key.id;
    let q = sig.q;
    let q_digest = hash_message::<H>(id, q, &sig.ots_sig.random, message);
    let with_cksm = digest_with_checksum(params, &q_digest);
    let w = params.w as usize;
    let chain_len = ((1u16 << w) - 1) as u8;

    let z: Vec<LmsHash> = sig
        .ots_sig
        .sig
        .iter()
        .zip(0u16..)
        .map(|(y_i, i)| {
            let a = coefficient(&with_cksm, i as usize, w);
            (a..chain_len).fold(*y_i, |tmp, j| chain_step::<H>(id, q, i, j, &tmp))
        })
        .collect();
    let candidate = hash_ots_pubkey::<H>(id, q, &z);

    let mut node_num = (1u32 << height) + q;
    let mut tmp = hash_leaf::<H>(id, node_num, &candidate);
    for node in &sig.tree_path {
        tmp = if node_num % 2 == 1 {
            hash_intr::<H>(id, node_num / 2, node, &tmp)
        } else {
            hash_intr::<H>(id, node_num / 2, &tmp, node)
        };
        node_num /= 2;
    }

    Ok(tmp == pub_key.digest)
}

#[cfg(all(test, feature = "rustcrypto"))]
mod tests {
    use super::*;
    use crate::rustcrypto::RustCryptoHasher;

    const TEST_ID: LmsIdentifier = [
        0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x2b, 0x2c, 0x2d, 0x2e,
        0x2f,
    ];
    const TEST_SEED: LmsHash = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
    ];

    fn test_priv_key(otstype: LmotsAlgorithmType) -> ImageLmsPrivKey {
        ImageLmsPrivKey {
            tree_type: LmsAlgorithmType::LmsSha256N24H5,
            otstype,
            id: TEST_ID,
            seed: TEST_SEED,
            q: 0,
        }
    }

    #[test]
    fn test_coefficient() {
        let s = [0x12u8, 0x34];
        assert_eq!(coefficient(&s, 0, 4), 0x1);
        assert_eq!(coefficient(&s, 3, 4), 0x4);
        assert_eq!(coefficient(&s, 1, 8), 0x34);
        assert_eq!(coefficient(&s, 3, 1), 1);
        assert_eq!(coefficient(&s, 2, 2), 0);
    }

    #[test]
    fn test_parameters() {
        let params = get_lmots_parameters(LmotsAlgorithmType::LmotsSha256N24W4).unwrap();
        assert_eq!((params.w, params.p, params.ls), (4, 51, 4));
        assert_eq!(get_lms_height(LmsAlgorithmType::LmsSha256N24H15).unwrap(), 15);
        assert!(get_lmots_parameters(LmotsAlgorithmType::LmotsReserved).is_err());
        assert!(get_lms_height(LmsAlgorithmType(5)).is_err());
    }

    #[test]
    fn test_lms_pubkey() {
        let priv_key = test_priv_key(LmotsAlgorithmType::LmotsSha256N24W8);
        let expected_pub_key = ImageLmsPublicKey {
            tree_type: LmsAlgorithmType::LmsSha256N24H5,
            otstype: LmotsAlgorithmType::LmotsSha256N24W8,
            id: TEST_ID,
            digest: [
                0x2c, 0x57, 0x14, 0x50, 0xae, 0xd9, 0x9c, 0xfb, 0x4f, 0x4a, 0xc2, 0x85, 0xda, 0x14,
                0x88, 0x27, 0x96, 0x61, 0x83, 0x14, 0x50, 0x8b, 0x12, 0xd2,
            ],
        };
        let pub_key = generate_lms_pubkey::<RustCryptoHasher>(&priv_key).unwrap();
        assert_eq!(expected_pub_key, pub_key);
    }

    #[test]
    fn test_lms_sig() {
        let priv_key = test_priv_key(LmotsAlgorithmType::LmotsSha256N24W8);
        let expected_ots_sig: [[u8; 24]; 26] = [
            [
                0xe1, 0x3b, 0x9f, 0x08, 0x75, 0xf0, 0x93, 0x61, 0xdc, 0x77, 0xfc, 0xc4, 0x48, 0x1e,
                0xa4, 0x63, 0xc0, 0x73, 0x71, 0x62, 0x49, 0x71, 0x91, 0x93,
            ],
            [
                0x61, 0x4b, 0x83, 0x5b, 0x46, 0x94, 0xc0, 0x59, 0xf1, 0x2d, 0x3a, 0xed, 0xd3, 0x4f,
                0x3d, 0xb9, 0x3f, 0x35, 0x80, 0xfb, 0x88, 0x74, 0x3b, 0x8b,
            ],
            [
                0x3d, 0x06, 0x48, 0xc0, 0x53, 0x7b, 0x7a, 0x50, 0xe4, 0x33, 0xd7, 0xea, 0x9d, 0x66,
                0x72, 0xff, 0xfc, 0x5f, 0x42, 0x77, 0x0f, 0xea, 0xb4, 0xf9,
            ],
            [
                0x8e, 0xb3, 0xf3, 0xb2, 0x3f, 0xd2, 0x06, 0x1e, 0x4d, 0x0b, 0x38, 0xf8, 0x32, 0x86,
                0x0a, 0xe7, 0x66, 0x73, 0xad, 0x1a, 0x1a, 0x52, 0xa9, 0x00,
            ],
            [
                0x5d, 0xcf, 0x1b, 0xfb, 0x56, 0xfe, 0x16, 0xff, 0x72, 0x36, 0x27, 0x61, 0x2f, 0x9a,
                0x48, 0xf7, 0x90, 0xf3, 0xc4, 0x7a, 0x67, 0xf8, 0x70, 0xb8,
            ],
            [
                0x1e, 0x91, 0x9d, 0x99, 0x91, 0x9c, 0x8d, 0xb4, 0x81, 0x68, 0x83, 0x8c, 0xec, 0xe0,
                0xab, 0xfb, 0x68, 0x3d, 0xa4, 0x8b, 0x92, 0x09, 0x86, 0x8b,
            ],
            [
                0xe8, 0xec, 0x10, 0xc6, 0x3d, 0x8b, 0xf8, 0x0d, 0x36, 0x49, 0x8d, 0xfc, 0x20, 0x5d,
                0xc4, 0x5d, 0x0d, 0xd8, 0x70, 0x57, 0x2d, 0x6d, 0x8f, 0x1d,
            ],
            [
                0x90, 0x17, 0x7c, 0xf5, 0x13, 0x7b, 0x8b, 0xbf, 0x7b, 0xcb, 0x67, 0xa4, 0x6f, 0x86,
                0xf2, 0x6c, 0xfa, 0x5a, 0x44, 0xcb, 0xca, 0xa4, 0xe1, 0x8d,
            ],
            [
                0xa0, 0x99, 0xa9, 0x8b, 0x0b, 0x3f, 0x96, 0xd5, 0xac, 0x8a, 0xc3, 0x75, 0xd8, 0xda,
                0x2a, 0x7c, 0x24, 0x80, 0x04, 0xba, 0x11, 0xd7, 0xac, 0x77,
            ],
            [
                0x5b, 0x92, 0x18, 0x35, 0x9c, 0xdd, 0xab, 0x4c, 0xf8, 0xcc, 0xc6, 0xd5, 0x4c, 0xb7,
                0xe1, 0xb3, 0x5a, 0x36, 0xdd, 0xc9, 0x26, 0x5c, 0x08, 0x70,
            ],
            [
                0x63, 0xd2, 0xfc, 0x67, 0x42, 0xa7, 0x17, 0x78, 0x76, 0x47, 0x6a, 0x32, 0x4b, 0x03,
                0x29, 0x5b, 0xfe, 0xd9, 0x9f, 0x2e, 0xaf, 0x1f, 0x38, 0x97,
            ],
            [
                0x05, 0x83, 0xc1, 0xb2, 0xb6, 0x16, 0xaa, 0xd0, 0xf3, 0x1c, 0xd7, 0xa4, 0xb1, 0xbb,
                0x0a, 0x51, 0xe4, 0x77, 0xe9, 0x4a, 0x01, 0xbb, 0xb4, 0xd6,
            ],
            [
                0xf8, 0x86, 0x6e, 0x25, 0x28, 0xa1, 0x59, 0xdf, 0x3d, 0x6c, 0xe2, 0x44, 0xd2, 0xb6,
                0x51, 0x8d, 0x1f, 0x02, 0x12, 0x28, 0x5a, 0x3c, 0x2d, 0x4a,
            ],
            [
                0x92, 0x70, 0x54, 0xa1, 0xe1, 0x62, 0x0b, 0x5b, 0x02, 0xaa, 0xb0, 0xc8, 0xc1, 0x0e,
                0xd4, 0x8a, 0xe5, 0x18, 0xea, 0x73, 0xcb, 0xa8, 0x1f, 0xcf,
            ],
            [
                0xff, 0x88, 0xbf, 0xf4, 0x61, 0xda, 0xc5, 0x1e, 0x7a, 0xb4, 0xca, 0x75, 0xf4, 0x7a,
                0x62, 0x59, 0xd2, 0x48, 0x20, 0xb9, 0x99, 0x57, 0x92, 0xd1,
            ],
            [
                0x39, 0xf6, 0x1a, 0xe2, 0xa8, 0x18, 0x6a, 0xe4, 0xe3, 0xc9, 0xbf, 0xe0, 0xaf, 0x2c,
                0xc7, 0x17, 0xf4, 0x24, 0xf4, 0x1a, 0xa6, 0x7f, 0x03, 0xfa,
            ],
            [
                0xed, 0xb0, 0x66, 0x51, 0x15, 0xf2, 0x06, 0x7a, 0x46, 0x84, 0x3a, 0x4c, 0xbb, 0xd2,
                0x97, 0xd5, 0xe8, 0x3b, 0xc1, 0xaa, 0xfc, 0x18, 0xd1, 0xd0,
            ],
            [
                0x3b, 0x3d, 0x89, 0x4e, 0x85, 0x95, 0xa6, 0x52, 0x60, 0x73, 0xf0, 0x2a, 0xb0, 0xf0,
                0x8b, 0x99, 0xfd, 0x9e, 0xb2, 0x08, 0xb5, 0x9f, 0xf6, 0x31,
            ],
            [
                0x7e, 0x55, 0x45, 0xe6, 0xf9, 0xad, 0x5f, 0x9c, 0x18, 0x3a, 0xbd, 0x04, 0x3d, 0x5a,
                0xcd, 0x6e, 0xb2, 0xdd, 0x4d, 0xa3, 0xf0, 0x2d, 0xbc, 0x31,
            ],
            [
                0x67, 0xb4, 0x68, 0x72, 0x0a, 0x4b, 0x8b, 0x92, 0xdd, 0xfe, 0x79, 0x60, 0x99, 0x8b,
                0xb7, 0xa0, 0xec, 0xf2, 0xa2, 0x6a, 0x37, 0x59, 0x82, 0x99,
            ],
            [
                0x41, 0x3f, 0x7b, 0x2a, 0xec, 0xd3, 0x9a, 0x30, 0xce, 0xc5, 0x27, 0xb4, 0xd9, 0x71,
                0x0c, 0x44, 0x73, 0x63, 0x90, 0x22, 0x45, 0x1f, 0x50, 0xd0,
            ],
            [
                0x1c, 0x04, 0x57, 0x12, 0x5d, 0xa0, 0xfa, 0x44, 0x29, 0xc0, 0x7d, 0xad, 0x85, 0x9c,
                0x84, 0x6c, 0xbb, 0xd9, 0x3a, 0xb5, 0xb9, 0x1b, 0x01, 0xbc,
            ],
            [
                0x77, 0x0b, 0x08, 0x9c, 0xfe, 0xde, 0x6f, 0x65, 0x1e, 0x86, 0xdd, 0x7c, 0x15, 0x98,
                0x9c, 0x8b, 0x53, 0x21, 0xde, 0xa9, 0xca, 0x60, 0x8c, 0x71,
            ],
            [
                0xfd, 0x86, 0x23, 0x23, 0x07, 0x2b, 0x82, 0x7c, 0xee, 0x7a, 0x7e, 0x28, 0xe4, 0xe2,
                0xb9, 0x99, 0x64, 0x72, 0x33, 0xc3, 0x45, 0x69, 0x44, 0xbb,
            ],
            [
                0x7a, 0xef, 0x91, 0x87, 0xc9, 0x6b, 0x3f, 0x5b, 0x79, 0xfb, 0x98, 0xbc, 0x76, 0xc3,
                0x57, 0x4d, 0xd0, 0x6f, 0x0e, 0x95, 0x68, 0x5e, 0x5b, 0x3a,
            ],
            [
                0xef, 0x3a, 0x54, 0xc4, 0x15, 0x5f, 0xe3, 0xad, 0x81, 0x77, 0x49, 0x62, 0x9c, 0x30,
                0xad, 0xbe, 0x89, 0x7c, 0x4f, 0x44, 0x54, 0xc8, 0x6c, 0x49,
            ],
        ];
        let message: [u8; 28] = [
            0x54, 0x65, 0x73, 0x74, 0x20, 0x6d, 0x65, 0x73, 0x73, 0x61, 0x67, 0x65, 0x20, 0x66, 0x6f,
            0x72, 0x20, 0x53, 0x48, 0x41, 0x32, 0x35, 0x36, 0x2d, 0x31, 0x39, 0x32, 0x0a,
        ];
        let nonce: LmsHash = [
            0x0b, 0x50, 0x40, 0xa1, 0x8c, 0x1b, 0x5c, 0xab, 0xcb, 0xc8, 0x5b, 0x04, 0x74, 0x02, 0xec,
            0x62, 0x94, 0xa3, 0x0d, 0xd8, 0xda, 0x8f, 0xc3, 0xda,
        ];
        let expected_tree_path: [[u8; 24]; 5] = [
            [
                0xe9, 0xca, 0x10, 0xea, 0xa8, 0x11, 0xb2, 0x2a, 0xe0, 0x7f, 0xb1, 0x95, 0xe3, 0x59,
                0x0a, 0x33, 0x4e, 0xa6, 0x42, 0x09, 0x94, 0x2f, 0xba, 0xe3,
            ],
            [
                0x38, 0xd1, 0x9f, 0x15, 0x21, 0x82, 0xc8, 0x07, 0xd3, 0xc4, 0x0b, 0x18, 0x9d, 0x3f,
                0xcb, 0xea, 0x94, 0x2f, 0x44, 0x68, 0x24, 0x39, 0xb1, 0x91,
            ],
            [
                0x33, 0x2d, 0x33, 0xae, 0x0b, 0x76, 0x1a, 0x2a, 0x8f, 0x98, 0x4b, 0x56, 0xb2, 0xac,
                0x2f, 0xd4, 0xab, 0x08, 0x22, 0x3a, 0x69, 0xed, 0x1f, 0x77,
            ],
            [
                0x19, 0xc7, 0xaa, 0x7e, 0x9e, 0xee, 0x96, 0x50, 0x4b, 0x0e, 0x60, 0xc6, 0xbb, 0x5c,
                0x94, 0x2d, 0x69, 0x5f, 0x04, 0x93, 0xeb, 0x25, 0xf8, 0x0a,
            ],
            [
                0x58, 0x71, 0xcf, 0xfd, 0x13, 0x1d, 0x0e, 0x04, 0xff, 0xe5, 0x06, 0x5b, 0xc7, 0x87,
                0x5e, 0x82, 0xd3, 0x4b, 0x40, 0xb6, 0x9d, 0xd9, 0xf3, 0xc1,
            ],
        ];

        let sig = sign_with_lms_key::<RustCryptoHasher>(&priv_key, &message, &nonce, 5).unwrap();

        assert_eq!(sig.q, 5);
        assert_eq!(sig.tree_type, LmsAlgorithmType::LmsSha256N24H5);
        assert_eq!(sig.ots_sig.ots_type, LmotsAlgorithmType::LmotsSha256N24W8);
        assert_eq!(sig.ots_sig.random, nonce);
        assert_eq!(sig.ots_sig.sig, expected_ots_sig.to_vec());
        assert_eq!(sig.tree_path, expected_tree_path.to_vec());

        let pub_key = generate_lms_pubkey::<RustCryptoHasher>(&priv_key).unwrap();
        assert!(verify_lms_signature::<RustCryptoHasher>(&message, &pub_key, &sig).unwrap());
    }

    #[test]
    fn test_sign_verify_w4() {
        let priv_key = test_priv_key(LmotsAlgorithmType::LmotsSha256N24W4);
        let pub_key = generate_lms_pubkey::<RustCryptoHasher>(&priv_key).unwrap();
        let message = [0x5au8; 48];

        for q in [0, 13, 31] {
            let sig = sign_with_lms_key::<RustCryptoHasher>(&priv_key, &message, &[0x77; 24], q)
                .unwrap();
            assert_eq!(sig.ots_sig.sig.len(), 51);
            assert_eq!(sig.tree_path.len(), 5);
            assert!(verify_lms_signature::<RustCryptoHasher>(&message, &pub_key, &sig).unwrap());

            let mut tampered = message;
            tampered[47] ^= 1;
            assert!(
                !verify_lms_signature::<RustCryptoHasher>(&tampered, &pub_key, &sig).unwrap()
            );

            let mut bad_path = sig.clone();
            bad_path.tree_path[4][0] ^= 1;
            assert!(
                !verify_lms_signature::<RustCryptoHasher>(&message, &pub_key, &bad_path).unwrap()
            );
        }
    }

    #[test]
    fn test_sign_invalid_q() {
        let priv_key = test_priv_key(LmotsAlgorithmType::LmotsSha256N24W8);
        assert!(sign_with_lms_key::<RustCryptoHasher>(&priv_key, b"msg", &[0; 24], 32).is_err());
    }
}
