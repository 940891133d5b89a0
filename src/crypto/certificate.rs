use crate::crypto::HashAlg;
use crate::crypto::errors::CryptoResult;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use openssl::nid::Nid;
use openssl::x509::{X509, X509NameRef, X509Ref};

/// The certificate facts a XAdES-BES signature publishes about its signer.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    content: String,
    digest: String,
    issuer_name: String,
    subject_name: String,
    serial_number: String,
}

impl CertificateInfo {
    /// Parse a DER encoded X.509 certificate
    pub fn from_der(der: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let cert = X509::from_der(der.as_ref())?;
        Self::from_x509(&cert)
    }

    pub fn from_x509(cert: &X509Ref) -> CryptoResult<Self> {
        let der = cert.to_der()?;
        let digest = HashAlg::Sha1.digest_base64(&der)?;
        let serial_number = cert.serial_number().to_bn()?.to_dec_str()?.to_string();

        Ok(Self {
            content: BASE64.encode(&der),
            digest,
            issuer_name: distinguished_name(cert.issuer_name())?,
            subject_name: distinguished_name(cert.subject_name())?,
            serial_number,
        })
    }

    /// Base64 of the DER encoding, the `ds:X509Certificate` content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Base64 SHA-1 digest of the DER encoding
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Serial number in decimal
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }
}

/// Render a distinguished name country-last, the way the SRI validator
/// reads it back through `X500Principal`.
///
/// Entries are emitted in reverse of their encoded order and joined with `,`.
pub fn distinguished_name(name: &X509NameRef) -> CryptoResult<String> {
    let mut parts = Vec::new();
    for entry in name.entries() {
        let object = entry.object();
        let nid = object.nid();
        let short_name = if nid == Nid::UNDEF {
            object.to_string()
        } else {
            nid.short_name()
                .map(str::to_string)
                .unwrap_or_else(|_| object.to_string())
        };
        let value = entry.data().to_string()?;
        parts.push(format!("{}={value}", normalize_short_name(&short_name)));
    }
    parts.reverse();
    Ok(parts.join(","))
}

/// `X500Principal` only understands `EMAILADDRESS` for the PKCS#9 email attribute.
fn normalize_short_name(short_name: &str) -> &str {
    match short_name {
        "E" | "emailAddress" => "EMAILADDRESS",
        other => other,
    }
}
