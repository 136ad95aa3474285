//! Minimal owned XML tree used as the payload of every project file.
//!
//! Names are kept exactly as written (`SSIS:Property`), namespace
//! declarations are ordinary attributes, and lookups match on local names so
//! documents using different prefixes still resolve.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ProjectError, Result};

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Returns the part of a qualified name after the prefix.
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute by exact qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute by local name, ignoring prefix. Namespace declarations are
    /// never matched.
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| !key.starts_with("xmlns") && local_name(key) == local)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Rewrites an attribute matched by local name, keeping its prefix.
    /// Returns false if no such attribute exists.
    pub fn replace_attribute_local(&mut self, local: &str, value: impl Into<String>) -> bool {
        match self
            .attributes
            .iter_mut()
            .find(|(key, _)| !key.starts_with("xmlns") && local_name(key) == local)
        {
            Some((_, existing)) => {
                *existing = value.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Child elements with the given local name.
    pub fn children<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |child| child.local_name() == local)
    }

    pub fn children_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.elements_mut()
            .filter(move |child| child.local_name() == local)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|child| child.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|child| child.local_name() == local)
    }

    /// First child element matching `predicate`, appending `make()` if none
    /// does.
    pub fn find_or_insert<P, M>(&mut self, predicate: P, make: M) -> &mut XmlElement
    where
        P: Fn(&XmlElement) -> bool,
        M: FnOnce() -> XmlElement,
    {
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(child) if predicate(child)));
        let index = match existing {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::Element(make()));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(child) => child,
            XmlNode::Text(_) => unreachable!("index points at an element"),
        }
    }

    /// Follows a path of local names from this element.
    pub fn path(&self, locals: &[&str]) -> Option<&XmlElement> {
        locals
            .iter()
            .try_fold(self, |element, local| element.child(local))
    }

    pub fn path_mut(&mut self, locals: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in locals {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// True if the element has no direct text content.
    pub fn has_text(&self) -> bool {
        self.children
            .iter()
            .any(|node| matches!(node, XmlNode::Text(text) if !text.is_empty()))
    }

    /// Replaces the direct text content, keeping child elements.
    pub fn set_text(&mut self, text: Option<&str>) {
        self.children
            .retain(|node| matches!(node, XmlNode::Element(_)));
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Visits this element and every descendant, depth first, stopping at
    /// the first error.
    pub fn try_visit_mut<F>(&mut self, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&mut XmlElement) -> Result<()>,
    {
        visitor(self)?;
        for child in self.elements_mut() {
            child.try_visit_mut(visitor)?;
        }
        Ok(())
    }

    pub fn visit_mut<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&mut XmlElement),
    {
        visitor(self);
        for child in self.elements_mut() {
            child.visit_mut(visitor);
        }
    }

    /// Visits this element and every descendant, depth first.
    pub fn visit<F>(&self, visitor: &mut F)
    where
        F: FnMut(&XmlElement),
    {
        visitor(self);
        for child in self.elements() {
            child.visit(visitor);
        }
    }

    /// Drops whitespace-only text between child elements (indentation).
    fn drop_layout_whitespace(&mut self) {
        let has_elements = self
            .children
            .iter()
            .any(|node| matches!(node, XmlNode::Element(_)));
        if has_elements {
            self.children
                .retain(|node| !matches!(node, XmlNode::Text(text) if text.trim().is_empty()));
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// Parses a document and returns its root element.
///
/// Errors are reported as invalid format without a file name; callers attach
/// one with [`ProjectError::for_file`].
pub fn parse(bytes: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ProjectError::invalid("", format!("malformed XML: {e}")))?;
        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| ProjectError::invalid("", "unbalanced end tag"))?;
                element.drop_layout_whitespace();
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text)
                    .map_err(|e| ProjectError::invalid("", format!("invalid UTF-8: {e}")))?;
                let value = quick_xml::escape::unescape(raw)
                    .map_err(|e| ProjectError::invalid("", format!("bad escape: {e}")))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&value);
                }
            }
            Event::CData(data) => {
                let value = std::str::from_utf8(&data)
                    .map_err(|e| ProjectError::invalid("", format!("invalid UTF-8: {e}")))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(value);
                }
            }
            Event::GeneralRef(reference) => {
                let name = std::str::from_utf8(&reference)
                    .map_err(|e| ProjectError::invalid("", format!("invalid UTF-8: {e}")))?;
                let resolved = resolve_reference(name)?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ProjectError::invalid("", "unexpected end of document"));
    }
    root.ok_or_else(|| ProjectError::invalid("", "document has no root element"))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .map_err(|e| ProjectError::invalid("", format!("invalid element name: {e}")))?;
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| ProjectError::invalid("", format!("bad attribute: {e}")))?;
        let key = String::from_utf8(attribute.key.as_ref().to_vec())
            .map_err(|e| ProjectError::invalid("", format!("invalid attribute name: {e}")))?;
        let raw = std::str::from_utf8(&attribute.value)
            .map_err(|e| ProjectError::invalid("", format!("invalid UTF-8: {e}")))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|e| ProjectError::invalid("", format!("bad escape: {e}")))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(ProjectError::invalid("", "multiple root elements")),
    }
    Ok(())
}

fn resolve_reference(name: &str) -> Result<String> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|code| {
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse().ok(),
            };
            value.and_then(char::from_u32)
        }),
    };
    resolved
        .map(String::from)
        .ok_or_else(|| ProjectError::invalid("", format!("unknown entity &{name};")))
}

/// Serializes an element as a standalone UTF-8 document.
pub fn to_bytes(root: &XmlElement) -> Result<Vec<u8>> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    write_element(&mut xml, root)?;
    Ok(xml.into_inner())
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        xml.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }
    xml.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(xml, child)?,
            XmlNode::Text(text) => xml
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?,
        }
    }
    xml.write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn write_error<E: std::fmt::Display>(error: E) -> ProjectError {
    ProjectError::invalid("", format!("failed to write XML: {error}"))
}
