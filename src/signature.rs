//! XAdES-BES enveloped signatures for SRI electronic documents.
//!
//! The signature covers three references: the signed properties, the key
//! info carrying the signing certificate, and the document itself through
//! the enveloped-signature transform. Every referenced fragment is digested
//! in the canonical form it takes once embedded, with the namespaces it
//! inherits from the signature element.

mod context;
mod signer;
mod templates;

pub use context::{Clock, FixedClock, IdGenerator, RandomIds, SequentialIds, SystemClock};
pub use signer::{
    Signer, sign, sign_credit_note_xml, sign_debit_note_xml, sign_invoice_xml,
    sign_purchase_liquidation_xml, sign_shipping_guide_xml, sign_withholding_certificate_xml,
};

/// Human readable description of the signed content
pub const DOCUMENT_DESCRIPTION: &str = "contenido comprobante";

pub const DOCUMENT_MIME_TYPE: &str = "text/xml";

/// Format of `xades:SigningTime`, e.g. `2024-04-18T14:34:32.878-05:00`
pub const SIGNING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

// Algorithm URIs
pub mod algorithms {
    // Canonicalization algorithms
    pub const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";

    // Signature algorithms
    pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";

    // Digest algorithms
    pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";

    // Transform algorithms
    pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

    // Reference types
    pub const SIGNED_PROPERTIES_TYPE: &str = "http://uri.etsi.org/01903#SignedProperties";
}

// Namespaces
pub mod ns {
    use crate::xml::Namespace;

    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
    pub const XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";

    pub fn ds() -> Namespace {
        Namespace::prefixed("ds", DS)
    }

    pub fn xades() -> Namespace {
        Namespace::prefixed("xades", XADES)
    }
}
