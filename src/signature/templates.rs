//! Serde models of the signature fragments.
//!
//! Every interpolated value is a plain struct field, so quick-xml escapes it
//! on serialization and the canonicalizer brings it to its normalized form.

use serde::Serialize;

use super::context::SignatureIds;
use super::{DOCUMENT_DESCRIPTION, DOCUMENT_MIME_TYPE, algorithms, ns};
use crate::crypto::{CertificateInfo, RsaKeyValue};

#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmElement {
    #[serde(rename = "@Algorithm")]
    pub algorithm: &'static str,
}

impl AlgorithmElement {
    fn new(algorithm: &'static str) -> Self {
        Self { algorithm }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "ds:X509Data")]
    pub x509_data: X509Data,
    #[serde(rename = "ds:KeyValue")]
    pub key_value: KeyValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct X509Data {
    #[serde(rename = "ds:X509Certificate")]
    pub certificate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyValue {
    #[serde(rename = "ds:RSAKeyValue")]
    pub rsa_key_value: RsaKeyValueElement,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsaKeyValueElement {
    #[serde(rename = "ds:Modulus")]
    pub modulus: String,
    #[serde(rename = "ds:Exponent")]
    pub exponent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedProperties {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "xades:SignedSignatureProperties")]
    pub signed_signature_properties: SignedSignatureProperties,
    #[serde(rename = "xades:SignedDataObjectProperties")]
    pub signed_data_object_properties: SignedDataObjectProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedSignatureProperties {
    #[serde(rename = "xades:SigningTime")]
    pub signing_time: String,
    #[serde(rename = "xades:SigningCertificate")]
    pub signing_certificate: SigningCertificate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SigningCertificate {
    #[serde(rename = "xades:Cert")]
    pub cert: Cert,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cert {
    #[serde(rename = "xades:CertDigest")]
    pub cert_digest: CertDigest,
    #[serde(rename = "xades:IssuerSerial")]
    pub issuer_serial: IssuerSerial,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertDigest {
    #[serde(rename = "ds:DigestMethod")]
    pub digest_method: AlgorithmElement,
    #[serde(rename = "ds:DigestValue")]
    pub digest_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuerSerial {
    #[serde(rename = "ds:X509IssuerName")]
    pub issuer_name: String,
    #[serde(rename = "ds:X509SerialNumber")]
    pub serial_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedDataObjectProperties {
    #[serde(rename = "xades:DataObjectFormat")]
    pub data_object_format: DataObjectFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataObjectFormat {
    #[serde(rename = "@ObjectReference")]
    pub object_reference: String,
    #[serde(rename = "xades:Description")]
    pub description: &'static str,
    #[serde(rename = "xades:MimeType")]
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedInfo {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "ds:CanonicalizationMethod")]
    pub canonicalization_method: AlgorithmElement,
    #[serde(rename = "ds:SignatureMethod")]
    pub signature_method: AlgorithmElement,
    #[serde(rename = "ds:Reference")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "@Type", skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<&'static str>,
    #[serde(rename = "@URI")]
    pub uri: String,
    #[serde(rename = "ds:Transforms", skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Transforms>,
    #[serde(rename = "ds:DigestMethod")]
    pub digest_method: AlgorithmElement,
    #[serde(rename = "ds:DigestValue")]
    pub digest_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transforms {
    #[serde(rename = "ds:Transform")]
    pub transforms: Vec<AlgorithmElement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signature {
    #[serde(rename = "@xmlns:ds")]
    pub xmlns_ds: &'static str,
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "ds:SignedInfo")]
    pub signed_info: SignedInfo,
    #[serde(rename = "ds:SignatureValue")]
    pub signature_value: SignatureValue,
    #[serde(rename = "ds:KeyInfo")]
    pub key_info: KeyInfo,
    #[serde(rename = "ds:Object")]
    pub object: SignatureObject,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureValue {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureObject {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "xades:QualifyingProperties")]
    pub qualifying_properties: QualifyingProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualifyingProperties {
    #[serde(rename = "@xmlns:xades")]
    pub xmlns_xades: &'static str,
    #[serde(rename = "@Target")]
    pub target: String,
    #[serde(rename = "xades:SignedProperties")]
    pub signed_properties: SignedProperties,
}

/// Digests of the three signed references, base64 encoded
#[derive(Debug, Clone)]
pub(crate) struct ReferenceDigests {
    pub signed_properties: String,
    pub key_info: String,
    pub document: String,
}

pub(crate) fn key_info(ids: &SignatureIds, certificate: &CertificateInfo, key_value: RsaKeyValue) -> KeyInfo {
    KeyInfo {
        id: ids.certificate.clone(),
        x509_data: X509Data {
            certificate: certificate.content().to_owned(),
        },
        key_value: KeyValue {
            rsa_key_value: RsaKeyValueElement {
                modulus: key_value.modulus,
                exponent: key_value.exponent,
            },
        },
    }
}

pub(crate) fn signed_properties(
    ids: &SignatureIds,
    signing_time: String,
    certificate: &CertificateInfo,
) -> SignedProperties {
    SignedProperties {
        id: ids.signed_properties.clone(),
        signed_signature_properties: SignedSignatureProperties {
            signing_time,
            signing_certificate: SigningCertificate {
                cert: Cert {
                    cert_digest: CertDigest {
                        digest_method: AlgorithmElement::new(algorithms::SHA1),
                        digest_value: certificate.digest().to_owned(),
                    },
                    issuer_serial: IssuerSerial {
                        issuer_name: certificate.issuer_name().to_owned(),
                        serial_number: certificate.serial_number().to_owned(),
                    },
                },
            },
        },
        signed_data_object_properties: SignedDataObjectProperties {
            data_object_format: DataObjectFormat {
                object_reference: format!("#{}", ids.document_ref),
                description: DOCUMENT_DESCRIPTION,
                mime_type: DOCUMENT_MIME_TYPE,
            },
        },
    }
}

pub(crate) fn signed_info(ids: &SignatureIds, document_id: &str, digests: ReferenceDigests) -> SignedInfo {
    SignedInfo {
        id: ids.signed_info.clone(),
        canonicalization_method: AlgorithmElement::new(algorithms::C14N),
        signature_method: AlgorithmElement::new(algorithms::RSA_SHA1),
        references: vec![
            Reference {
                id: ids.signed_properties_ref.clone(),
                reference_type: Some(algorithms::SIGNED_PROPERTIES_TYPE),
                uri: format!("#{}", ids.signed_properties),
                transforms: None,
                digest_method: AlgorithmElement::new(algorithms::SHA1),
                digest_value: digests.signed_properties,
            },
            Reference {
                id: ids.certificate_ref.clone(),
                reference_type: None,
                uri: format!("#{}", ids.certificate),
                transforms: None,
                digest_method: AlgorithmElement::new(algorithms::SHA1),
                digest_value: digests.key_info,
            },
            Reference {
                id: ids.document_ref.clone(),
                reference_type: None,
                uri: format!("#{document_id}"),
                transforms: Some(Transforms {
                    transforms: vec![AlgorithmElement::new(algorithms::ENVELOPED_SIGNATURE)],
                }),
                digest_method: AlgorithmElement::new(algorithms::SHA1),
                digest_value: digests.document,
            },
        ],
    }
}

pub(crate) fn signature(
    ids: &SignatureIds,
    signed_info: SignedInfo,
    signature_value: String,
    key_info: KeyInfo,
    signed_properties: SignedProperties,
) -> Signature {
    Signature {
        xmlns_ds: ns::DS,
        id: ids.signature.clone(),
        signed_info,
        signature_value: SignatureValue {
            id: ids.signature_value.clone(),
            value: signature_value,
        },
        key_info,
        object: SignatureObject {
            id: ids.signature_object.clone(),
            qualifying_properties: QualifyingProperties {
                xmlns_xades: ns::XADES,
                target: format!("#{}", ids.signature),
                signed_properties,
            },
        },
    }
}
