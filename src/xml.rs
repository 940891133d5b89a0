//! Ordered XML tree model and the value normalization applied while parsing.

pub mod entities;
mod tree;

pub use tree::{Attribute, Element, Namespace, Node, parse, root_element, serialize};
