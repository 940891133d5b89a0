mod certificate;
mod errors;
mod pkcs12;
pub mod rsa;

pub use certificate::{CertificateInfo, distinguished_name};
pub use errors::{Error, Pkcs12Error};
pub use pkcs12::KeyMaterial;
pub use rsa::{RsaKeyValue, RsaPrivateKey, RsaSignature};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use errors::CryptoResult;
use openssl::hash::{Hasher, MessageDigest as Digest};

/// Hash algorithms used by the signature pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-1, the only digest SRI validators accept
    Sha1,
}

impl HashAlg {
    /// Hash the given data with this hash algorithm
    pub fn hash(&self, data: impl AsRef<[u8]>) -> CryptoResult<Vec<u8>> {
        let mut hasher = Hasher::new(self.into())?;
        hasher.update(data.as_ref())?;
        Ok(hasher.finish()?.to_vec())
    }

    /// Hash the given data and encode the digest as standard base64
    pub fn digest_base64(&self, data: impl AsRef<[u8]>) -> CryptoResult<String> {
        Ok(BASE64.encode(self.hash(data)?))
    }
}

impl From<&HashAlg> for Digest {
    fn from(hash_alg: &HashAlg) -> Self {
        match hash_alg {
            HashAlg::Sha1 => Digest::sha1(),
        }
    }
}

impl From<HashAlg> for Digest {
    fn from(hash_alg: HashAlg) -> Self {
        (&hash_alg).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_data() {
        assert_eq!(HashAlg::Sha1.hash(b"test_data").unwrap().len(), 20);
    }

    #[test]
    fn test_sha1_digest_base64() {
        // SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(
            HashAlg::Sha1.digest_base64("abc").unwrap(),
            "qZk+NkcGgWq6PiVxeFDCbJzQ2J0="
        );
    }
}
