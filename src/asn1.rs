//! DER structures decoded with `rasn`.

pub mod oid;
pub mod pkcs12;
