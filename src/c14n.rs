//! Canonical XML serialization.
//!
//! Produces the byte-exact form that both signer and verifier digest: no XML
//! declaration, comments removed, empty elements expanded, namespace
//! declarations first (default, then by prefix) followed by attributes
//! (unqualified by local name, then qualified by namespace URI and local
//! name), and every value in its normalized encoded form.
//!
//! Inherited namespaces model the declarations a fragment receives from the
//! signature element it will be embedded in. They are merged into top-level
//! elements only; a local declaration of the same prefix wins.

use std::cmp::Ordering;

use tracing::trace;

use crate::errors::{Error, Result};
use crate::xml::{self, Attribute, Element, Namespace, Node};

/// Namespace bound to the `xml` prefix without a declaration
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Canonicalize a document or fragment.
///
/// The output is a pure function of the input markup and the inherited
/// namespaces, and canonicalizing it again yields the same string.
pub fn canonicalize(xml: impl AsRef<str>, inherited_namespaces: Option<&[Namespace]>) -> Result<String> {
    let xml = xml.as_ref();
    let nodes = xml::parse(xml)?;
    let nodes = canonicalize_nodes(nodes, inherited_namespaces.unwrap_or_default())?;
    let canonical = xml::serialize(&nodes)?;

    trace!(
        input_len = xml.len(),
        output_len = canonical.len(),
        "canonicalized xml"
    );
    Ok(canonical)
}

/// Canonicalize an already parsed forest of top-level nodes
pub fn canonicalize_nodes(nodes: Vec<Node>, inherited_namespaces: &[Namespace]) -> Result<Vec<Node>> {
    nodes
        .into_iter()
        .filter(|node| match node {
            Node::Comment(_) => false,
            Node::Text(text) => !is_xml_whitespace(text),
            Node::Element(_) => true,
        })
        .map(|node| match node {
            Node::Element(element) => canonicalize_element(element, inherited_namespaces).map(Node::Element),
            other => Ok(other),
        })
        .collect()
}

fn canonicalize_element(element: Element, inherited_namespaces: &[Namespace]) -> Result<Element> {
    let Element {
        name,
        namespaces,
        attributes,
        children,
    } = element;

    let attributes = sort_attributes(&name, attributes, &namespaces)?;
    let namespaces = merge_namespaces(namespaces, inherited_namespaces);

    let children = children
        .into_iter()
        .filter(|child| !matches!(child, Node::Comment(_)))
        .map(|child| match child {
            Node::Element(element) => canonicalize_element(element, &[]).map(Node::Element),
            other => Ok(other),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Element {
        name,
        namespaces,
        attributes,
        children,
    })
}

/// Local declarations plus the inherited ones they do not shadow, default
/// namespace first and the rest by prefix
fn merge_namespaces(local: Vec<Namespace>, inherited: &[Namespace]) -> Vec<Namespace> {
    let mut merged: Vec<Namespace> = inherited
        .iter()
        .filter(|ns| !local.iter().any(|own| own.prefix == ns.prefix))
        .cloned()
        .collect();
    merged.extend(local);
    merged.sort_by(|a, b| a.prefix.cmp(&b.prefix));
    merged
}

/// Order attributes after resolving each prefix against the element's own
/// declarations. Resolution happens after all declarations are known, so
/// their position among the attributes does not matter.
fn sort_attributes(element: &str, attributes: Vec<Attribute>, namespaces: &[Namespace]) -> Result<Vec<Attribute>> {
    let mut resolved = attributes
        .into_iter()
        .map(|attr| {
            let uri = match attr.prefix.as_deref() {
                None => None,
                Some(prefix) => Some(resolve_prefix(prefix, namespaces).ok_or_else(|| {
                    Error::XmlFormat(format!(
                        "attribute '{}' on <{element}> uses the undeclared prefix '{prefix}'",
                        attr.qualified_name()
                    ))
                })?),
            };
            Ok((uri, attr))
        })
        .collect::<Result<Vec<(Option<String>, Attribute)>>>()?;

    resolved.sort_by(|(uri_a, a), (uri_b, b)| attribute_order(uri_a.as_deref(), a, uri_b.as_deref(), b));
    Ok(resolved.into_iter().map(|(_, attr)| attr).collect())
}

fn resolve_prefix(prefix: &str, namespaces: &[Namespace]) -> Option<String> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE.to_owned());
    }
    namespaces
        .iter()
        .find(|ns| ns.prefix.as_deref() == Some(prefix))
        .map(|ns| ns.uri.clone())
}

fn attribute_order(uri_a: Option<&str>, a: &Attribute, uri_b: Option<&str>, b: &Attribute) -> Ordering {
    match (uri_a, uri_b) {
        (None, None) => a.local_name.cmp(&b.local_name),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(uri_a), Some(uri_b)) => uri_a
            .bytes()
            .chain(a.local_name.bytes())
            .cmp(uri_b.bytes().chain(b.local_name.bytes())),
    }
}

fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}
