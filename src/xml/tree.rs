use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::attributes::Attribute as RawAttribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use super::entities;
use crate::errors::{Error, Result};

/// A namespace declaration, `xmlns="uri"` or `xmlns:prefix="uri"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            uri: uri.into(),
        }
    }

    /// `xmlns="uri"`
    pub fn default_namespace(uri: impl Into<String>) -> Self {
        Self::new(None, uri)
    }

    /// `xmlns:prefix="uri"`
    pub fn prefixed(prefix: &str, uri: impl Into<String>) -> Self {
        Self::new(Some(prefix), uri)
    }

    /// The attribute name used to declare this namespace
    pub fn declaration_name(&self) -> Cow<'static, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("xmlns:{prefix}")),
            None => Cow::Borrowed("xmlns"),
        }
    }
}

/// A non-namespace attribute. `value` is already in its normalized encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(prefix: Option<&str>, local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.local_name)),
            None => Cow::Borrowed(&self.local_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified tag name as written, including any prefix
    pub name: String,
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value of the attribute with the given qualified name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.qualified_name() == name)
            .map(|attr| attr.value.as_str())
    }
}

/// A node of the ordered tree. Text holds its normalized encoded form and
/// comments hold their raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// The first element among top-level nodes
pub fn root_element(nodes: &[Node]) -> Option<&Element> {
    nodes.iter().find_map(|node| match node {
        Node::Element(element) => Some(element),
        _ => None,
    })
}

/// Parse markup into an ordered forest of top-level nodes.
///
/// The XML declaration, processing instructions and DOCTYPE are skipped.
/// Elements still open at the end of input are closed implicitly. CDATA
/// sections become text.
pub fn parse(xml: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut open: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => open.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                append(&mut open, &mut top, Node::Element(element));
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| Error::XmlFormat("closing tag without a matching opening tag".into()))?;
                append(&mut open, &mut top, Node::Element(element));
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text)?;
                let value = entities::process_text_value(&entities::normalize_line_endings(raw));
                append(&mut open, &mut top, Node::Text(value));
            }
            Event::CData(cdata) => {
                let raw = std::str::from_utf8(&cdata)?;
                let value = entities::encode_text(&entities::normalize_line_endings(raw));
                append(&mut open, &mut top, Node::Text(value));
            }
            Event::Comment(comment) => {
                let raw = std::str::from_utf8(&comment)?;
                append(&mut open, &mut top, Node::Comment(raw.to_owned()));
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    while let Some(element) = open.pop() {
        append(&mut open, &mut top, Node::Element(element));
    }

    Ok(top)
}

fn append(open: &mut [Element], top: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => push_node(&mut parent.children, node),
        None => push_node(top, node),
    }
}

/// Adjacent text nodes are merged; quick-xml splits text around CDATA
fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(previous)), Node::Text(text)) = (nodes.last_mut(), &node) {
        previous.push_str(text);
        return;
    }
    nodes.push(node);
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref())?;
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let raw = std::str::from_utf8(&attr.value)?;
        let raw = entities::normalize_line_endings(raw);
        let value = entities::process_attribute_value(&entities::normalize_whitespace(&raw));

        match key.split_once(':') {
            Some(("xmlns", prefix)) => element.namespaces.push(Namespace::prefixed(prefix, value)),
            Some((prefix, local_name)) => {
                element
                    .attributes
                    .push(Attribute::new(Some(prefix), local_name, value));
            }
            None if key == "xmlns" => element.namespaces.push(Namespace::default_namespace(value)),
            None => element.attributes.push(Attribute::new(None, key, value)),
        }
    }

    Ok(element)
}

/// Serialize nodes back to markup. Elements are always written with explicit
/// start and end tags and attribute values in double quotes, namespace
/// declarations before attributes.
pub fn serialize(nodes: &[Node]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for namespace in &element.namespaces {
                let key = namespace.declaration_name();
                start.push_attribute(RawAttribute {
                    key: QName(key.as_bytes()),
                    value: Cow::Borrowed(namespace.uri.as_bytes()),
                });
            }
            for attr in &element.attributes {
                let key = attr.qualified_name();
                start.push_attribute(RawAttribute {
                    key: QName(key.as_bytes()),
                    value: Cow::Borrowed(attr.value.as_bytes()),
                });
            }
            writer.write_event(Event::Start(start))?;
            for child in &element.children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
        }
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?,
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
    }
    Ok(())
}
