use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::se::to_string_with_root as xml_to_string;
use tracing::{debug, info};

use super::context::{Clock, IdGenerator, RandomIds, SignatureIds, SystemClock};
use super::templates::{self, ReferenceDigests};
use super::{SIGNING_TIME_FORMAT, ns};
use crate::c14n;
use crate::crypto::{HashAlg, KeyMaterial, rsa};
use crate::document::{DocumentType, ValidatedDocument, validate_for_signing};
use crate::errors::{Error, Result};

/// Signs documents with one key and certificate.
///
/// The clock and the id source are replaceable so that output can be made
/// reproducible.
#[derive(Debug)]
pub struct Signer<C = SystemClock, I = RandomIds> {
    key_material: KeyMaterial,
    clock: C,
    ids: I,
}

impl Signer {
    pub fn new(key_material: KeyMaterial) -> Self {
        Self {
            key_material,
            clock: SystemClock,
            ids: RandomIds,
        }
    }

    /// Load the key and certificate from a PKCS#12 archive, given as DER
    /// bytes or as base64 text
    pub fn from_pkcs12(pkcs12: impl AsRef<[u8]>, password: Option<&str>) -> Result<Self> {
        let key_material = KeyMaterial::from_pkcs12(pkcs12, password)?;
        Ok(Self::new(key_material))
    }
}

impl<C: Clock, I: IdGenerator> Signer<C, I> {
    pub fn with_clock<T: Clock>(self, clock: T) -> Signer<T, I> {
        Signer {
            key_material: self.key_material,
            clock,
            ids: self.ids,
        }
    }

    pub fn with_ids<T: IdGenerator>(self, ids: T) -> Signer<C, T> {
        Signer {
            key_material: self.key_material,
            clock: self.clock,
            ids,
        }
    }

    pub fn key_material(&self) -> &KeyMaterial {
        &self.key_material
    }

    /// Validate and sign a document. When `document_type` is given the root
    /// tag must match it exactly.
    pub fn sign(&self, document_xml: &str, document_type: Option<&str>) -> Result<String> {
        let document = validate_for_signing(document_xml, document_type)?;
        self.sign_validated(document_xml, &document)
    }

    pub fn sign_document(&self, document_xml: &str, document_type: DocumentType) -> Result<String> {
        self.sign(document_xml, Some(document_type.root_tag()))
    }

    pub(crate) fn sign_validated(&self, document_xml: &str, document: &ValidatedDocument) -> Result<String> {
        let ids = SignatureIds::generate(&self.ids);
        let signing_time = self.clock.now().format(SIGNING_TIME_FORMAT).to_string();
        let certificate = self.key_material.certificate();
        let private_key = self.key_material.private_key();
        let ds = [ns::ds()];
        let xades_ds = [ns::xades(), ns::ds()];

        let key_info = templates::key_info(&ids, certificate, private_key.key_value()?);
        let key_info_c14n = c14n::canonicalize(xml_to_string("ds:KeyInfo", &key_info)?, Some(ds.as_slice()))?;

        let signed_properties = templates::signed_properties(&ids, signing_time, certificate);
        let signed_properties_c14n = c14n::canonicalize(
            xml_to_string("xades:SignedProperties", &signed_properties)?,
            Some(xades_ds.as_slice()),
        )?;

        let document_c14n = c14n::canonicalize(document_xml, None)?;

        let digests = ReferenceDigests {
            signed_properties: HashAlg::Sha1.digest_base64(&signed_properties_c14n)?,
            key_info: HashAlg::Sha1.digest_base64(&key_info_c14n)?,
            document: HashAlg::Sha1.digest_base64(&document_c14n)?,
        };
        debug!(
            signed_properties = %digests.signed_properties,
            key_info = %digests.key_info,
            document = %digests.document,
            "computed reference digests"
        );

        let signed_info = templates::signed_info(&ids, document.id(), digests);
        let signed_info_c14n = c14n::canonicalize(xml_to_string("ds:SignedInfo", &signed_info)?, Some(ds.as_slice()))?;
        let signature_value = rsa::sign(private_key, &signed_info_c14n, HashAlg::Sha1)?;

        let signature = templates::signature(
            &ids,
            signed_info,
            signature_value.to_base64(),
            key_info,
            signed_properties,
        );
        // embedded canonical, so the signed output does not depend on serializer details
        let signature_xml = c14n::canonicalize(xml_to_string("ds:Signature", &signature)?, None)?;
        let signed = insert_before_root_end(document_xml, &signature_xml)?;

        info!(
            document_type = %document.document_type(),
            signature_id = %ids.signature,
            "document signed"
        );
        Ok(signed)
    }
}

/// Validate and sign `document_xml` with the key and certificate in a PKCS#12
/// archive.
///
/// The document is validated before the archive is opened, so a malformed
/// document is reported even when the archive is unusable too.
pub fn sign(
    document_xml: &str,
    pkcs12: impl AsRef<[u8]>,
    password: Option<&str>,
    document_type: Option<&str>,
) -> Result<String> {
    let document = validate_for_signing(document_xml, document_type)?;
    let signer = Signer::from_pkcs12(pkcs12, password)?;
    signer.sign_validated(document_xml, &document)
}

pub fn sign_invoice_xml(document_xml: &str, pkcs12: impl AsRef<[u8]>, password: Option<&str>) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::Factura.root_tag()))
}

pub fn sign_purchase_liquidation_xml(
    document_xml: &str,
    pkcs12: impl AsRef<[u8]>,
    password: Option<&str>,
) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::LiquidacionCompra.root_tag()))
}

pub fn sign_credit_note_xml(document_xml: &str, pkcs12: impl AsRef<[u8]>, password: Option<&str>) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::NotaCredito.root_tag()))
}

pub fn sign_debit_note_xml(document_xml: &str, pkcs12: impl AsRef<[u8]>, password: Option<&str>) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::NotaDebito.root_tag()))
}

pub fn sign_shipping_guide_xml(
    document_xml: &str,
    pkcs12: impl AsRef<[u8]>,
    password: Option<&str>,
) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::GuiaRemision.root_tag()))
}

pub fn sign_withholding_certificate_xml(
    document_xml: &str,
    pkcs12: impl AsRef<[u8]>,
    password: Option<&str>,
) -> Result<String> {
    sign(document_xml, pkcs12, password, Some(DocumentType::ComprobanteRetencion.root_tag()))
}

/// Insert `signature` immediately before the closing tag of the root element
fn insert_before_root_end(xml: &str, signature: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::Empty(start) if depth == 0 => {
                return Err(Error::XmlFormat(format!(
                    "root element <{}> has no closing tag",
                    String::from_utf8_lossy(start.name().as_ref())
                )));
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = usize::try_from(reader.buffer_position())
                        .map_err(|_| Error::XmlFormat("document is too large".into()))?;
                    let start = xml[..end]
                        .rfind("</")
                        .ok_or_else(|| Error::XmlFormat("closing root tag not found".into()))?;

                    let mut signed = String::with_capacity(xml.len() + signature.len());
                    signed.push_str(&xml[..start]);
                    signed.push_str(signature);
                    signed.push_str(&xml[start..]);
                    return Ok(signed);
                }
            }
            Event::Eof => return Err(Error::XmlFormat("closing root tag not found".into())),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_goes_before_root_end() {
        let xml = "<?xml version=\"1.0\"?>\n<factura Id=\"comprobante\"><a></a><b/></factura   >\n";
        assert_eq!(
            insert_before_root_end(xml, "<ds:Signature/>").unwrap(),
            "<?xml version=\"1.0\"?>\n<factura Id=\"comprobante\"><a></a><b/><ds:Signature/></factura   >\n"
        );
    }

    #[test]
    fn test_nested_element_with_root_name_is_skipped() {
        let xml = "<factura><factura>x</factura>\n</factura>";
        assert_eq!(
            insert_before_root_end(xml, "<S/>").unwrap(),
            "<factura><factura>x</factura>\n<S/></factura>"
        );
    }

    #[test]
    fn test_comment_after_root_is_ignored() {
        let xml = "<factura>x</factura><!-- </factura> -->";
        assert_eq!(
            insert_before_root_end(xml, "<S/>").unwrap(),
            "<factura>x<S/></factura><!-- </factura> -->"
        );
    }

    #[test]
    fn test_self_closing_root_is_rejected() {
        assert!(matches!(
            insert_before_root_end("<factura/>", "<S/>"),
            Err(Error::XmlFormat(msg)) if msg.contains("factura")
        ));
    }

    #[test]
    fn test_signing_time_format() {
        let instant = chrono::DateTime::parse_from_rfc3339("2024-04-18T14:34:32.878-05:00").unwrap();
        assert_eq!(
            instant.format(SIGNING_TIME_FORMAT).to_string(),
            "2024-04-18T14:34:32.878-05:00"
        );
    }
}
