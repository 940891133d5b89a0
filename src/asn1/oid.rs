//! Object identifiers of the PKCS#7 and PKCS#12 structures read by the signer.

// PKCS#7 content types
pub const DATA_OID: &[u32] = &[1, 2, 840, 113549, 1, 7, 1];
pub const ENCRYPTED_DATA_OID: &[u32] = &[1, 2, 840, 113549, 1, 7, 6];

// PKCS#12 bag types (RFC 7292 Appendix D)
pub const KEY_BAG_OID: &[u32] = &[1, 2, 840, 113549, 1, 12, 10, 1, 1];
pub const PKCS8_SHROUDED_KEY_BAG_OID: &[u32] = &[1, 2, 840, 113549, 1, 12, 10, 1, 2];

// PKCS#9 attributes
pub const FRIENDLY_NAME_OID: &[u32] = &[1, 2, 840, 113549, 1, 9, 20];
