#![allow(dead_code)]

use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder};
use sri_signer::signature::{FixedClock, SequentialIds, Signer};

pub const PASSWORD: &str = "clave-de-prueba";

pub const SIGNING_TIME: &str = "2024-04-18T14:34:32.878-05:00";

pub const SERIAL_NUMBER: &str = "1234567890123";

pub const ISSUER_NAME: &str =
    "CN=AC BANCO CENTRAL DEL ECUADOR,OU=ENTIDAD DE CERTIFICACION DE INFORMACION-ECIBCE,O=BANCO CENTRAL DEL ECUADOR,C=EC";

pub const INVOICE: &str = include_str!("../../test_data/factura.xml");

/// Archive whose certificate carries `ISSUER_NAME` and `SERIAL_NUMBER`, the
/// key `factura_signed.xml` was produced with
pub const SIGNER_P12: &[u8] = include_bytes!("../../test_data/pkcs12/signer.p12");

/// A minimal document of the given root
pub fn document(root: &str) -> String {
    format!(r#"<{root} id="comprobante" version="1.0.0"><infoTributaria><ambiente>1</ambiente></infoTributaria></{root}>"#)
}

pub struct TestIdentity {
    pub key: PKey<Private>,
    pub certificate: X509,
    pub pkcs12: Vec<u8>,
}

fn name(entries: &[(&str, &str)]) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    for (field, value) in entries {
        name.append_entry_by_text(field, value).unwrap();
    }
    name.build()
}

/// A signing certificate issued by a throwaway CA, packed with its key in a
/// password protected PKCS#12 archive
pub fn test_identity() -> TestIdentity {
    let ca_key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let issuer = name(&[
        ("C", "EC"),
        ("O", "BANCO CENTRAL DEL ECUADOR"),
        ("OU", "ENTIDAD DE CERTIFICACION DE INFORMACION-ECIBCE"),
        ("CN", "AC BANCO CENTRAL DEL ECUADOR"),
    ]);
    let subject = name(&[("C", "EC"), ("O", "DISTRIBUIDORA ANDINA"), ("CN", "MARIA NUNEZ")]);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = Asn1Integer::from_bn(&BigNum::from_dec_str(SERIAL_NUMBER).unwrap()).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&subject).unwrap();
    builder.set_issuer_name(&issuer).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
    let certificate = builder.build();

    let pkcs12 = Pkcs12::builder()
        .name("Signing Key")
        .pkey(&key)
        .cert(&certificate)
        .build2(PASSWORD)
        .unwrap()
        .to_der()
        .unwrap();

    TestIdentity {
        key,
        certificate,
        pkcs12,
    }
}

/// A signer whose output only depends on its input
pub fn deterministic_signer(identity: &TestIdentity) -> Signer<FixedClock, SequentialIds> {
    deterministic_signer_for(&identity.pkcs12)
}

pub fn deterministic_signer_for(pkcs12: &[u8]) -> Signer<FixedClock, SequentialIds> {
    let instant = chrono::DateTime::parse_from_rfc3339(SIGNING_TIME).unwrap();
    Signer::from_pkcs12(pkcs12, Some(PASSWORD))
        .unwrap()
        .with_clock(FixedClock(instant))
        .with_ids(SequentialIds::new())
}

/// The first `<tag ...>...</tag>` element in `xml`, markup included
pub fn element<'a>(xml: &'a str, tag: &str) -> &'a str {
    let start = xml
        .find(&format!("<{tag} "))
        .or_else(|| xml.find(&format!("<{tag}>")))
        .unwrap_or_else(|| panic!("<{tag}> not found"));
    let close = format!("</{tag}>");
    let end = xml[start..].find(&close).unwrap_or_else(|| panic!("</{tag}> not found")) + start + close.len();
    &xml[start..end]
}

/// Text content of the first `<tag>` element in `xml`
pub fn text<'a>(xml: &'a str, tag: &str) -> &'a str {
    let element = element(xml, tag);
    let open_end = element.find('>').unwrap() + 1;
    let close_start = element.rfind("</").unwrap();
    &element[open_end..close_start]
}

/// The `ds:Reference` whose Id starts with `id_prefix`
pub fn reference<'a>(xml: &'a str, id_prefix: &str) -> &'a str {
    let start = xml
        .find(&format!("<ds:Reference Id=\"{id_prefix}"))
        .unwrap_or_else(|| panic!("reference {id_prefix} not found"));
    let end = xml[start..].find("</ds:Reference>").unwrap() + start + "</ds:Reference>".len();
    &xml[start..end]
}
