#![forbid(unsafe_code)]

//! Key derivation and decryption for PKCS#12.
//!
//! Three paths:
//! 1. PKCS#12 KDF (RFC 7292 Appendix B) — for MAC key derivation and legacy PBE
//! 2. Legacy PBE: pbeWithSHAAnd3-KeyTripleDES-CBC using PKCS#12 KDF
//! 3. PBES2: PBKDF2 + AES-256-CBC (modern OpenSSL 3.x default)

use cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use firma_core::Error;
use hmac::Hmac;
use sha1::Sha1;
use sha2::{Digest, Sha256};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Des3CbcDec = cbc::Decryptor<des::TdesEde3>;

/// PKCS#12 KDF ID values (RFC 7292 Appendix B.3).
pub const ID_KEY: u8 = 1;
pub const ID_IV: u8 = 2;
pub const ID_MAC: u8 = 3;

/// PRF selection for PBKDF2 (PBES2 path).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pbkdf2Prf {
    HmacSha1,
    HmacSha256,
}

/// PKCS#12 KDF (RFC 7292 Appendix B), SHA-1 variant (u=20, v=64).
///
/// `id` is 1 for key, 2 for IV, 3 for MAC key.  `password` is the
/// BMP-encoded password (UTF-16BE with two trailing zero bytes).
pub fn pkcs12_kdf_sha1(
    id: u8,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Vec<u8> {
    pkcs12_kdf_generic::<Sha1>(id, password, salt, iterations, output_len, 20, 64)
}

/// PKCS#12 KDF (RFC 7292 Appendix B), SHA-256 variant (u=32, v=64).
pub fn pkcs12_kdf_sha256(
    id: u8,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Vec<u8> {
    pkcs12_kdf_generic::<Sha256>(id, password, salt, iterations, output_len, 32, 64)
}

fn pkcs12_kdf_generic<D>(
    id: u8,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
    u: usize,
    v: usize,
) -> Vec<u8>
where
    D: Digest + sha2::digest::FixedOutputReset,
{
    // Step 1: Construct D = id repeated v times
    let d_block = vec![id; v];

    // Steps 2-3: pad salt and password out to multiples of v
    let s = extend_to_multiple(salt, v);
    let p = extend_to_multiple(password, v);

    // Step 4: I = S || P
    let mut i_block = Vec::with_capacity(s.len() + p.len());
    i_block.extend_from_slice(&s);
    i_block.extend_from_slice(&p);

    let num_blocks = output_len.div_ceil(u);
    let mut result = Vec::with_capacity(num_blocks * u);

    for block_idx in 0..num_blocks {
        // Step 6a: A = H^c(D || I)
        let mut hasher = D::new();
        Digest::update(&mut hasher, &d_block);
        Digest::update(&mut hasher, &i_block);
        let mut a = hasher.finalize_reset();

        for _ in 1..iterations {
            Digest::update(&mut hasher, &a);
            a = hasher.finalize_reset();
        }

        result.extend_from_slice(&a);

        // Step 6b: I_j = (I_j + B + 1) mod 2^(v*8), skipped after the last block
        if block_idx + 1 < num_blocks {
            let b = extend_to_multiple(&a, v);
            for j in 0..(i_block.len() / v) {
                add_one_plus_b(&mut i_block[j * v..(j + 1) * v], &b);
            }
        }
    }

    result.truncate(output_len);
    result
}

/// Extend `data` by repeating it to fill a multiple of `v` bytes.
/// If `data` is empty, returns empty.
fn extend_to_multiple(data: &[u8], v: usize) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let len = data.len().div_ceil(v) * v;
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let take = (len - out.len()).min(data.len());
        out.extend_from_slice(&data[..take]);
    }
    out
}

/// Compute (I_j + B + 1) mod 2^(v*8) in-place on `block`, where `b` has the same length.
fn add_one_plus_b(block: &mut [u8], b: &[u8]) {
    let mut carry: u16 = 1;
    for k in (0..block.len()).rev() {
        let sum = block[k] as u16 + b[k] as u16 + carry;
        block[k] = sum as u8;
        carry = sum >> 8;
    }
}

/// Encode a password as BMP (UTF-16BE) with two trailing zero bytes, per PKCS#12 spec.
pub fn password_to_bmp(password: &str) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let mut bmp = Vec::with_capacity(password.len() * 2 + 2);
    for c in password.encode_utf16() {
        bmp.push((c >> 8) as u8);
        bmp.push(c as u8);
    }
    bmp.push(0);
    bmp.push(0);
    bmp
}

/// Decrypt ciphertext using legacy PBE: pbeWithSHAAnd3-KeyTripleDES-CBC.
/// Uses PKCS#12 KDF with SHA-1 to derive 24-byte key + 8-byte IV, then 3DES-CBC.
pub fn decrypt_pbe_sha1_3des(
    ciphertext: &[u8],
    bmp_password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>, Error> {
    let key = pkcs12_kdf_sha1(ID_KEY, bmp_password, salt, iterations, 24);
    let iv = pkcs12_kdf_sha1(ID_IV, bmp_password, salt, iterations, 8);

    let decryptor = Des3CbcDec::new_from_slices(&key, &iv)
        .map_err(|e| Error::Keystore(format!("3DES-CBC init failed: {e}")))?;

    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| Error::Keystore(format!("3DES-CBC decrypt/unpad failed: {e}")))?;

    Ok(plaintext.to_vec())
}

/// Decrypt ciphertext using PBES2: PBKDF2 (with the given PRF) + AES-256-CBC.
pub fn decrypt_pbes2_aes256cbc(
    ciphertext: &[u8],
    password: &str,
    pbkdf2_salt: &[u8],
    pbkdf2_iterations: u32,
    aes_iv: &[u8],
    prf: Pbkdf2Prf,
) -> Result<Vec<u8>, Error> {
    let mut key = [0u8; 32];
    match prf {
        Pbkdf2Prf::HmacSha1 => pbkdf2::pbkdf2_hmac::<Sha1>(
            password.as_bytes(),
            pbkdf2_salt,
            pbkdf2_iterations,
            &mut key,
        ),
        Pbkdf2Prf::HmacSha256 => pbkdf2::pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            pbkdf2_salt,
            pbkdf2_iterations,
            &mut key,
        ),
    }

    let decryptor = Aes256CbcDec::new_from_slices(&key, aes_iv)
        .map_err(|e| Error::Keystore(format!("AES-256-CBC init failed: {e}")))?;

    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| Error::Keystore(format!("AES-256-CBC decrypt/unpad failed: {e}")))?;

    Ok(plaintext.to_vec())
}

/// Compute HMAC for MAC verification.
pub fn compute_hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    use hmac::Mac;
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn compute_hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    use hmac::Mac;
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkcs12_kdf_sha1_deterministic() {
        let password = password_to_bmp("test");
        let salt = b"saltsalt";
        let key = pkcs12_kdf_sha1(ID_KEY, &password, salt, 2048, 24);
        assert_eq!(key.len(), 24);

        let key2 = pkcs12_kdf_sha1(ID_KEY, &password, salt, 2048, 24);
        assert_eq!(key, key2);

        // Different ID produces different output
        let iv = pkcs12_kdf_sha1(ID_IV, &password, salt, 2048, 8);
        assert_eq!(iv.len(), 8);
        assert_ne!(&key[..8], &iv[..]);
    }

    #[test]
    fn test_pkcs12_kdf_sha256_length() {
        let password = password_to_bmp("test");
        let key = pkcs12_kdf_sha256(ID_KEY, &password, b"saltsalt", 2048, 32);
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn test_kdf_multi_block_output() {
        // Output longer than one hash block exercises the I_j update step.
        let password = password_to_bmp("test");
        let out = pkcs12_kdf_sha1(ID_KEY, &password, b"saltsalt", 100, 48);
        assert_eq!(out.len(), 48);
        assert_ne!(&out[..20], &out[20..40]);
    }

    #[test]
    fn test_password_to_bmp() {
        assert!(password_to_bmp("").is_empty());

        // "A" -> 0x00 0x41 0x00 0x00
        assert_eq!(password_to_bmp("A"), vec![0x00, 0x41, 0x00, 0x00]);

        // "ab" -> 0x00 0x61 0x00 0x62 0x00 0x00
        assert_eq!(
            password_to_bmp("ab"),
            vec![0x00, 0x61, 0x00, 0x62, 0x00, 0x00]
        );
    }
}
