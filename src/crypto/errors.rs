use openssl::error::ErrorStack;
use thiserror::Error;

pub(crate) type CryptoResult<T> = Result<T, Error>;

/// Error type for cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid data format or corrupted data
    #[error("Invalid data: {0}")]
    Invalid(String),

    /// Internal OpenSSL error
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),
}

/// Failures while reading key material out of a PKCS#12 archive
#[derive(Error, Debug)]
pub enum Pkcs12Error {
    /// Neither DER nor base64-encoded DER, or structurally broken
    #[error("the archive could not be read: {0}")]
    Unreadable(String),

    /// MAC verification failed, which is what a wrong password looks like
    #[error("the password is incorrect")]
    WrongPassword,

    #[error("the archive does not contain a private key")]
    MissingPrivateKey,

    #[error("the archive does not contain a certificate matching the private key")]
    MissingCertificate,

    #[error("unsupported key material: {0}")]
    UnsupportedKey(String),
}

impl Pkcs12Error {
    /// Classify an OpenSSL failure raised while decrypting an archive
    pub(crate) fn from_parse_error(err: ErrorStack) -> Self {
        let mac_failure = err.errors().iter().any(|e| {
            e.reason()
                .is_some_and(|reason| reason.to_ascii_lowercase().contains("mac verify"))
        });

        if mac_failure {
            Pkcs12Error::WrongPassword
        } else {
            Pkcs12Error::Unreadable(err.to_string())
        }
    }
}
