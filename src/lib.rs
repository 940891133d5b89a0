pub mod access_key;
pub mod asn1;
pub mod c14n;
pub mod config;
pub mod crypto;
pub mod document;
pub mod errors;
pub mod signature;
pub mod telemetry;
pub mod xml;

pub use c14n::canonicalize;
pub use document::{DocumentType, ValidatedDocument, validate_for_signing};
pub use errors::{Error, Result};
pub use signature::{
    Signer, sign, sign_credit_note_xml, sign_debit_note_xml, sign_invoice_xml,
    sign_purchase_liquidation_xml, sign_shipping_guide_xml, sign_withholding_certificate_xml,
};
pub use xml::Namespace;
