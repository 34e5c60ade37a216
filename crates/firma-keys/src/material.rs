#![forbid(unsafe_code)]

//! Signing key material extracted from a PKCS#12 keystore.

use firma_core::{Error, Result};
use pkcs8::DecodePrivateKey;

/// An RSA private key paired with its X.509 certificate.
///
/// Scoped to a single signing operation; nothing here is cached between
/// invocations.
#[derive(Debug)]
pub struct KeyMaterial {
    /// The RSA private key.
    pub private_key: rsa::RsaPrivateKey,
    /// DER-encoded X.509 certificate for the signing key.
    pub certificate_der: Vec<u8>,
}

impl KeyMaterial {
    /// Extract key material from PKCS#12 keystore bytes.
    ///
    /// Takes the FIRST pkcs8ShroudedKeyBag and the FIRST certBag, in
    /// document order.  A keystore missing either is rejected.
    pub fn from_keystore(data: &[u8], password: &str) -> Result<Self> {
        let contents = firma_pkcs12::parse_keystore(data, password)?;

        let key_der = contents
            .private_keys
            .first()
            .ok_or_else(|| Error::Keystore("no PKCS#8 shrouded key bag in keystore".into()))?;
        let cert_der = contents
            .certificates
            .first()
            .ok_or_else(|| Error::Keystore("no certificate bag in keystore".into()))?;

        let private_key = rsa::RsaPrivateKey::from_pkcs8_der(key_der)
            .map_err(|e| Error::Keystore(format!("failed to load RSA key from PKCS#8: {e}")))?;

        Ok(Self {
            private_key,
            certificate_der: cert_der.clone(),
        })
    }

    /// Build key material from already decoded parts.
    pub fn from_parts(private_key: rsa::RsaPrivateKey, certificate_der: Vec<u8>) -> Self {
        Self {
            private_key,
            certificate_der,
        }
    }
}
