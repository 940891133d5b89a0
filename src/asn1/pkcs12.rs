//! The parts of a PKCS#12 archive (RFC 7292) OpenSSL's parser does not expose:
//! every private key bag together with its friendly name.

use rasn::error::DecodeError;
use rasn::prelude::{ObjectIdentifier as Oid, *};
use tracing::debug;

use super::oid::{DATA_OID, ENCRYPTED_DATA_OID, FRIENDLY_NAME_OID, KEY_BAG_OID, PKCS8_SHROUDED_KEY_BAG_OID};

/// PFX ::= SEQUENCE {
///     version     INTEGER {v3(3)}(v3,...),
///     authSafe    ContentInfo,
///     macData     MacData OPTIONAL
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
pub struct Pfx {
    pub version: Integer,
    pub auth_safe: ContentInfo,
    pub mac_data: Option<Any>,
}

/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content     [0] EXPLICIT ANY DEFINED BY contentType OPTIONAL
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
pub struct ContentInfo {
    pub content_type: Oid,
    #[rasn(tag(explicit(0)))]
    pub content: Option<Any>,
}

/// SafeBag ::= SEQUENCE {
///     bagId         BAG-TYPE.&id ({PKCS12BagSet}),
///     bagValue      [0] EXPLICIT BAG-TYPE.&Type({PKCS12BagSet}{@bagId}),
///     bagAttributes SET OF PKCS12Attribute OPTIONAL
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
pub struct SafeBag {
    pub bag_id: Oid,
    #[rasn(tag(explicit(0)))]
    pub bag_value: Any,
    pub bag_attributes: Option<SetOf<Any>>,
}

/// PKCS12Attribute ::= SEQUENCE {
///     attrId     ATTRIBUTE.&id ({PKCS12AttrSet}),
///     attrValues SET OF ATTRIBUTE.&Type ({PKCS12AttrSet}{@attrId})
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
pub struct Pkcs12Attribute {
    pub attr_id: Oid,
    pub attr_values: SetOf<Any>,
}

/// friendlyName values are BMPStrings; the content octets are UTF-16BE
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
#[rasn(tag(universal, 30))]
#[rasn(delegate)]
pub struct BmpName(pub OctetString);

/// A private key bag and the name it was exported under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBag {
    pub friendly_name: Option<String>,
    /// Whether `der` is a PKCS#8 EncryptedPrivateKeyInfo rather than a PrivateKeyInfo
    pub shrouded: bool,
    pub der: Vec<u8>,
}

/// List the key bags of an archive in the order they appear.
///
/// Only SafeContents stored as plain `data` are read. Exporters keep key bags
/// there since a shrouded key bag carries its own encryption; SafeContents
/// in `encryptedData` hold the certificates.
pub fn key_bags(pfx_der: &[u8]) -> Result<Vec<KeyBag>, DecodeError> {
    let pfx: Pfx = rasn::ber::decode(pfx_der)?;
    let Some(auth_safe) = data_content(&pfx.auth_safe)? else {
        debug!("PFX authSafe is not plain data, no key bags to list");
        return Ok(Vec::new());
    };
    let contents: SequenceOf<ContentInfo> = rasn::ber::decode(&auth_safe)?;

    let mut bags = Vec::new();
    for content_info in &contents {
        let Some(safe_contents) = data_content(content_info)? else {
            continue;
        };
        let safe_bags: SequenceOf<SafeBag> = rasn::ber::decode(&safe_contents)?;

        for bag in safe_bags {
            let bag_id: &[u32] = bag.bag_id.as_ref();
            let shrouded = match bag_id {
                PKCS8_SHROUDED_KEY_BAG_OID => true,
                KEY_BAG_OID => false,
                _ => continue,
            };
            bags.push(KeyBag {
                friendly_name: bag.bag_attributes.as_ref().and_then(friendly_name),
                shrouded,
                der: bag.bag_value.as_bytes().to_vec(),
            });
        }
    }

    debug!(count = bags.len(), "listed PKCS#12 key bags");
    Ok(bags)
}

/// Octets of a `data` ContentInfo, `None` for any other content type
fn data_content(content_info: &ContentInfo) -> Result<Option<OctetString>, DecodeError> {
    let content_type: &[u32] = content_info.content_type.as_ref();
    if content_type != DATA_OID {
        if content_type == ENCRYPTED_DATA_OID {
            debug!("skipping encrypted SafeContents");
        }
        return Ok(None);
    }

    match &content_info.content {
        Some(content) => rasn::ber::decode::<OctetString>(content.as_bytes()).map(Some),
        None => Ok(None),
    }
}

fn friendly_name(attributes: &SetOf<Any>) -> Option<String> {
    for encoded in attributes.to_vec() {
        let Ok(attribute) = rasn::ber::decode::<Pkcs12Attribute>(encoded.as_bytes()) else {
            continue;
        };
        let attr_id: &[u32] = attribute.attr_id.as_ref();
        if attr_id != FRIENDLY_NAME_OID {
            continue;
        }

        let value = attribute.attr_values.to_vec().into_iter().next()?;
        let name: BmpName = rasn::ber::decode(value.as_bytes()).ok()?;
        let units: Vec<u16> = name
            .0
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANCO_CENTRAL_P12: &[u8] = include_bytes!("../../test_data/pkcs12/banco_central.p12");

    #[test]
    fn test_key_bags_in_archive_order() {
        let bags = key_bags(BANCO_CENTRAL_P12).unwrap();
        let names: Vec<Option<&str>> = bags.iter().map(|bag| bag.friendly_name.as_deref()).collect();
        assert_eq!(names, vec![Some("Encryption Key"), Some("Signing Key")]);
        assert!(bags.iter().all(|bag| bag.shrouded));
    }

    #[test]
    fn test_friendly_name_is_decoded_from_bmp_string() {
        // SEQUENCE { friendlyName, SET { BMPString "Añ" } }
        let attribute = vec![
            0x30, 0x13, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x14, 0x31, 0x06,
            0x1E, 0x04, 0x00, 0x41, 0x00, 0xF1,
        ];

        let attributes = SetOf::from(vec![Any::new(attribute)]);
        assert_eq!(friendly_name(&attributes).as_deref(), Some("Añ"));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(key_bags(b"not a pfx").is_err());
    }
}
