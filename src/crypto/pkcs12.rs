use std::borrow::Cow;

use crate::asn1::pkcs12::{KeyBag, key_bags};
use crate::crypto::errors::Pkcs12Error;
use crate::crypto::{CertificateInfo, RsaPrivateKey};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use tracing::debug;

/// Certificate friendly-name marker of archives issued by Banco Central
const BANCO_CENTRAL_FRIENDLY_NAME: &str = "banco central";

/// Friendly name of the signing key bag in Banco Central archives
const SIGNING_KEY_FRIENDLY_NAME: &str = "signing key";

/// The private key and certificate a document is signed with.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    private_key: RsaPrivateKey,
    certificate: CertificateInfo,
}

impl KeyMaterial {
    /// Load key material from a PKCS#12 archive.
    ///
    /// `data` may hold the raw DER archive or its base64 text. A missing
    /// password is treated as the empty password.
    ///
    /// Banco Central archives carry an encryption key and a signing key; the
    /// key bag named `Signing Key` is used for them. Other archives use their
    /// first key. The certificate is the one holding the chosen key's public
    /// half.
    pub fn from_pkcs12(data: impl AsRef<[u8]>, password: Option<&str>) -> Result<Self, Pkcs12Error> {
        let password = password.unwrap_or_default();
        let der = archive_der(data.as_ref())?;
        let parsed = Pkcs12::from_der(&der)
            .map_err(|e| Pkcs12Error::Unreadable(e.to_string()))?
            .parse2(password)
            .map_err(Pkcs12Error::from_parse_error)?;

        let candidates: Vec<X509> = parsed
            .cert
            .into_iter()
            .chain(parsed.ca.into_iter().flatten())
            .collect();

        let pkey = if candidates
            .iter()
            .any(|cert| alias_contains(cert.alias(), BANCO_CENTRAL_FRIENDLY_NAME))
        {
            debug!("Banco Central archive, selecting the signing key bag");
            let bags = key_bags(&der).map_err(|e| Pkcs12Error::Unreadable(e.to_string()))?;
            signing_key(&bags, password)?
        } else {
            parsed.pkey.ok_or(Pkcs12Error::MissingPrivateKey)?
        };
        let cert = select_certificate(&pkey, candidates)?;

        let private_key = RsaPrivateKey::from_pkey(pkey)
            .map_err(|e| Pkcs12Error::UnsupportedKey(e.to_string()))?;
        let certificate = CertificateInfo::from_x509(&cert)
            .map_err(|e| Pkcs12Error::Unreadable(e.to_string()))?;

        debug!(
            subject = certificate.subject_name(),
            serial = certificate.serial_number(),
            bits = private_key.bits(),
            "Loaded signing key material"
        );

        Ok(Self::new(private_key, certificate))
    }

    /// Pair an already loaded key with its certificate
    pub fn new(private_key: RsaPrivateKey, certificate: CertificateInfo) -> Self {
        Self {
            private_key,
            certificate,
        }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn certificate(&self) -> &CertificateInfo {
        &self.certificate
    }
}

/// DER bytes of the archive, decoding base64 text when needed
fn archive_der(data: &[u8]) -> Result<Cow<'_, [u8]>, Pkcs12Error> {
    if Pkcs12::from_der(data).is_ok() {
        return Ok(Cow::Borrowed(data));
    }

    let text = std::str::from_utf8(data)
        .map_err(|_| Pkcs12Error::Unreadable("not a DER encoded PKCS#12 archive".into()))?;
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map(Cow::Owned)
        .map_err(|e| Pkcs12Error::Unreadable(format!("invalid base64: {e}")))
}

/// Decrypt the first key bag whose friendly name marks it as the signing key
fn signing_key(bags: &[KeyBag], password: &str) -> Result<PKey<Private>, Pkcs12Error> {
    let bag = bags
        .iter()
        .find(|bag| {
            let name = bag.friendly_name.as_deref().map(str::as_bytes);
            alias_contains(name, SIGNING_KEY_FRIENDLY_NAME)
        })
        .ok_or(Pkcs12Error::MissingPrivateKey)?;

    let key = if bag.shrouded {
        PKey::private_key_from_pkcs8_passphrase(&bag.der, password.as_bytes())
    } else {
        PKey::private_key_from_pkcs8(&bag.der)
    };
    key.map_err(|e| Pkcs12Error::UnsupportedKey(e.to_string()))
}

/// Pick the first certificate whose public key belongs to `pkey`
fn select_certificate(pkey: &PKey<Private>, candidates: Vec<X509>) -> Result<X509, Pkcs12Error> {
    candidates
        .into_iter()
        .find(|cert| {
            cert.public_key()
                .map(|public| public.public_eq(pkey))
                .unwrap_or(false)
        })
        .ok_or(Pkcs12Error::MissingCertificate)
}

/// Case-insensitive substring match on a friendly name
fn alias_contains(alias: Option<&[u8]>, needle: &str) -> bool {
    alias
        .map(|name| String::from_utf8_lossy(name).to_lowercase().contains(needle))
        .unwrap_or(false)
}
