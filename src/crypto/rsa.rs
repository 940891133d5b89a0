use crate::crypto::HashAlg;
use crate::crypto::errors::{CryptoResult, Error};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private};
use openssl::sign::{Signer, Verifier};
use std::fmt;

/// Represents an RSA PKCS#1 v1.5 signature
#[derive(Clone, PartialEq, Eq)]
pub struct RsaSignature {
    data: Vec<u8>,
}

impl RsaSignature {
    /// Create a new RSA signature
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Get the signature data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Standard base64 without line wrapping, as embedded in `SignatureValue`
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Get the signature length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if signature is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for RsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSignature")
            .field("size", &self.len())
            .field("base64", &self.to_base64())
            .finish()
    }
}

/// Public RSA parameters as published in `ds:RSAKeyValue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyValue {
    /// Base64 of the big-endian modulus
    pub modulus: String,
    /// Base64 of the big-endian public exponent
    pub exponent: String,
}

/// RSA private key wrapper
#[derive(Clone)]
pub struct RsaPrivateKey {
    key: PKey<Private>,
    bits: u32,
}

impl RsaPrivateKey {
    /// Load from PEM-encoded PKCS#1/PKCS#8.
    pub fn from_pem(pem_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let key = PKey::private_key_from_pem(pem_bytes.as_ref())?;
        Self::from_pkey(key)
    }

    /// Load from DER-encoded PKCS#1/PKCS#8.
    pub fn from_der(der_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let key = PKey::private_key_from_der(der_bytes.as_ref())?;
        Self::from_pkey(key)
    }

    /// Wrap an OpenSSL key, rejecting anything that is not RSA
    pub fn from_pkey(key: PKey<Private>) -> CryptoResult<Self> {
        let rsa = key
            .rsa()
            .map_err(|_| Error::Invalid("Private key is not an RSA key".into()))?;
        let bits = rsa.size() * 8;
        Ok(Self { key, bits })
    }

    /// Modulus and public exponent, base64 encoded
    pub fn key_value(&self) -> CryptoResult<RsaKeyValue> {
        let rsa = self.key.rsa()?;
        Ok(RsaKeyValue {
            modulus: BASE64.encode(rsa.n().to_vec()),
            exponent: BASE64.encode(rsa.e().to_vec()),
        })
    }

    /// Get the key size in bits
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Get the underlying OpenSSL private key
    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.key
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

/// Sign data using RSA PKCS#1 v1.5 with the given digest
pub fn sign(
    private_key: &RsaPrivateKey,
    data: impl AsRef<[u8]>,
    hash_alg: HashAlg,
) -> CryptoResult<RsaSignature> {
    let mut signer = Signer::new(hash_alg.into(), private_key.pkey())?;
    let signature_data = signer.sign_oneshot_to_vec(data.as_ref())?;

    Ok(RsaSignature::new(signature_data))
}

/// Verify an RSA PKCS#1 v1.5 signature
pub fn verify<T: HasPublic>(
    public_key: &PKeyRef<T>,
    data: impl AsRef<[u8]>,
    signature: &RsaSignature,
    hash_alg: HashAlg,
) -> CryptoResult<bool> {
    let mut verifier = Verifier::new(hash_alg.into(), public_key)?;
    let result = verifier.verify_oneshot(signature.as_bytes(), data.as_ref())?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::rsa::Rsa;

    fn generate_key() -> RsaPrivateKey {
        let rsa = Rsa::generate(2048).unwrap();
        RsaPrivateKey::from_pkey(PKey::from_rsa(rsa).unwrap()).unwrap()
    }

    #[test]
    fn test_rsa_sign_verify() {
        let key = generate_key();
        let data = b"test data";

        let signature = sign(&key, data, HashAlg::Sha1).unwrap();
        assert_eq!(signature.len(), 256);

        assert!(verify(key.pkey(), data, &signature, HashAlg::Sha1).unwrap());
        assert!(!verify(key.pkey(), b"wrong data", &signature, HashAlg::Sha1).unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = generate_key();
        let first = sign(&key, b"payload", HashAlg::Sha1).unwrap();
        let second = sign(&key, b"payload", HashAlg::Sha1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_roundtrip() {
        let key = generate_key();
        let der = key.pkey().private_key_to_der().unwrap();
        let pem = key.pkey().private_key_to_pem_pkcs8().unwrap();

        let from_der = RsaPrivateKey::from_der(&der).unwrap();
        let from_pem = RsaPrivateKey::from_pem(&pem).unwrap();
        assert_eq!(from_der.key_value().unwrap(), key.key_value().unwrap());
        assert_eq!(from_pem.key_value().unwrap(), key.key_value().unwrap());
        assert_eq!(from_der.bits(), 2048);
    }

    #[test]
    fn test_key_value_encodes_default_exponent() {
        let key = generate_key();
        // 65537 = 0x010001
        assert_eq!(key.key_value().unwrap().exponent, "AQAB");
    }

    #[test]
    fn test_non_rsa_key_is_rejected() {
        let group = openssl::ec::EcGroup::from_curve_name(openssl::nid::Nid::X9_62_PRIME256V1)
            .unwrap();
        let ec = openssl::ec::EcKey::generate(&group).unwrap();
        let pkey = PKey::from_ec_key(ec).unwrap();
        assert!(matches!(
            RsaPrivateKey::from_pkey(pkey),
            Err(Error::Invalid(_))
        ));
    }
}
