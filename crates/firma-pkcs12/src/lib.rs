#![forbid(unsafe_code)]

//! PKCS#12 (.p12/.pfx) parser for the Firma invoice signing library.
//!
//! Supports both legacy PBE (SHA-1 + 3DES-CBC) and modern PBES2
//! (PBKDF2 + AES-256-CBC) encryption as used by OpenSSL 3.x.

pub mod kdf;
mod parse;

/// Contents extracted from a PKCS#12 keystore, in document order.
#[derive(Debug)]
pub struct KeystoreContents {
    /// PKCS#8 DER-encoded private keys.
    pub private_keys: Vec<Vec<u8>>,
    /// DER-encoded X.509 certificates.
    pub certificates: Vec<Vec<u8>>,
}

/// Parse a PKCS#12 keystore, decrypting with the given password.
///
/// The MacData HMAC, when present, is verified first; a mismatch is
/// reported as a keystore error naming MAC verification, which is the
/// normal symptom of a wrong password.
pub fn parse_keystore(
    data: &[u8],
    password: &str,
) -> Result<KeystoreContents, firma_core::Error> {
    parse::parse_keystore(data, password)
}
