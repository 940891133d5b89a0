use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use super::DocumentType;
use crate::errors::{Error, Result};

/// A document that passed validation and can be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDocument {
    document_type: DocumentType,
    id: String,
}

impl ValidatedDocument {
    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// Value of the root `Id` attribute, the target of the document reference
    pub fn id(&self) -> &str {
        &self.id
    }
}

struct RootElement {
    name: String,
    id: Option<String>,
    has_version: bool,
}

/// Check that a document can be signed.
///
/// The document must be well-formed, free of DOCTYPE declarations,
/// processing instructions other than the XML declaration, `xml:` prefixed
/// attributes and namespace declarations, with a single root written with a
/// closing tag and nothing but whitespace and comments around it. The root
/// must be one of the supported document types, equal to `expected_root` when
/// given, and carry
/// `Id` and `version` attributes (names compared case-insensitively).
pub fn validate_for_signing(xml: &str, expected_root: Option<&str>) -> Result<ValidatedDocument> {
    let root = scan(xml)?;

    let document_type =
        DocumentType::from_root_tag(&root.name).ok_or_else(|| Error::UnsupportedDocumentType(root.name.clone()))?;

    if let Some(expected) = expected_root {
        if expected != root.name {
            return Err(Error::UnexpectedDocumentRoot {
                expected: expected.to_owned(),
                found: root.name,
            });
        }
    }

    let id = root.id.ok_or_else(|| {
        Error::unsupported(
            "missing Id attribute",
            format!("Root element '{}' must have an 'Id' attribute (case-insensitive).", root.name),
        )
    })?;
    if !root.has_version {
        return Err(Error::unsupported(
            "missing version attribute",
            format!("Root element '{}' must have a 'version' attribute (case-insensitive).", root.name),
        ));
    }

    debug!(%document_type, id = %id, "document validated");
    Ok(ValidatedDocument { document_type, id })
}

/// Stream through the whole document, rejecting unsupported constructs
fn scan(xml: &str) -> Result<RootElement> {
    if xml.trim().is_empty() {
        return Err(Error::XmlFormat("the document is empty".into()));
    }

    let mut reader = Reader::from_str(xml);
    let mut root: Option<RootElement> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::DocType(_) => {
                return Err(Error::unsupported(
                    "DOCTYPE declarations",
                    "DOCTYPE declarations are not supported. Remove any <!DOCTYPE> declarations from your XML.",
                ));
            }
            Event::PI(_) => {
                return Err(Error::unsupported(
                    "processing instructions",
                    "Only the XML declaration (<?xml ... ?>) is supported. Remove any other processing instructions from your XML.",
                ));
            }
            Event::Start(start) => {
                let element = check_element(&start)?;
                if depth == 0 {
                    if root.is_some() {
                        return Err(second_root(&element.name));
                    }
                    root = Some(element);
                }
                depth += 1;
            }
            Event::Empty(start) => {
                let element = check_element(&start)?;
                if depth == 0 {
                    if root.is_some() {
                        return Err(second_root(&element.name));
                    }
                    return Err(Error::unsupported(
                        "self-closing root element",
                        format!(
                            "Root element <{}/> has no closing tag to place the signature before. Write it as <{0}></{0}>.",
                            element.name
                        ),
                    ));
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::XmlFormat("text content is not allowed outside the root element".into()));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(Error::XmlFormat("CDATA is not allowed outside the root element".into()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(Error::XmlFormat("the document ends before its root element is closed".into()));
    }
    root.ok_or_else(|| Error::XmlFormat("the document has no root element".into()))
}

fn second_root(name: &str) -> Error {
    Error::XmlFormat(format!("found a second root element <{name}>; a document has exactly one root"))
}

fn check_element(start: &BytesStart<'_>) -> Result<RootElement> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
    let mut id = None;
    let mut has_version = false;

    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;

        if key.starts_with("xml:") {
            return Err(Error::unsupported(
                "xml-prefixed attributes",
                format!("Found attribute '{key}'. Remove any xml: prefixed attributes from your XML."),
            ));
        }
        if key == "xmlns" || key.starts_with("xmlns:") {
            return Err(Error::unsupported(
                "namespace declarations",
                format!(
                    "Found '{key}' on <{name}>. Namespace declarations are not supported in the document; the signature namespaces are added during signing."
                ),
            ));
        }

        if key.eq_ignore_ascii_case("id") {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw).map_err(|e| Error::XmlFormat(e.to_string()))?;
            id = Some(value.into_owned());
        } else if key.eq_ignore_ascii_case("version") {
            has_version = true;
        }
    }

    Ok(RootElement { name, id, has_version })
}
