#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5).

use firma_core::{algorithm, Error};
use signature::SignatureEncoding;

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &rsa::RsaPublicKey, data: &[u8], signature: &[u8])
        -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA1,
            hash: HashType::Sha1,
        })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA256,
            hash: HashType::Sha256,
        })),
        _ => Err(Error::Signing(format!(
            "unsupported signature algorithm: {uri}"
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha256,
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(key.clone());
                Ok(sk.sign(data).to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
        }
    }

    fn verify(
        &self,
        key: &rsa::RsaPublicKey,
        data: &[u8],
        sig_bytes: &[u8],
    ) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Signing(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> rsa::RsaPrivateKey {
        let mut rng = rand::thread_rng();
        rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap()
    }

    #[test]
    fn test_rsa_sha1_sign_verify() {
        let key = test_key();
        let alg = from_uri(algorithm::RSA_SHA1).unwrap();
        let sig = alg.sign(&key, b"payload").unwrap();
        assert!(alg.verify(&key.to_public_key(), b"payload", &sig).unwrap());
        assert!(!alg.verify(&key.to_public_key(), b"other", &sig).unwrap());
    }

    #[test]
    fn test_rsa_sha1_is_deterministic() {
        let key = test_key();
        let alg = from_uri(algorithm::RSA_SHA1).unwrap();
        let a = alg.sign(&key, b"payload").unwrap();
        let b = alg.sign(&key, b"payload").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rsa_sha256_sign_verify() {
        let key = test_key();
        let alg = from_uri(algorithm::RSA_SHA256).unwrap();
        let sig = alg.sign(&key, b"payload").unwrap();
        assert!(alg.verify(&key.to_public_key(), b"payload", &sig).unwrap());
    }

    #[test]
    fn test_unknown_uri_rejected() {
        assert!(from_uri("urn:nope").is_err());
    }
}
