//! Owned, read-only element tree built from `quick-xml` events.
//!
//! Text is stored the way the transcript markup needs it: `text` is the
//! content before an element's first child, `tail` the content following the
//! element's end tag inside its parent. Speaker names are nested elements
//! whose tails carry the actual utterance, so both must be kept.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::TransformError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
    pub tail: Option<String>,
}

impl XmlNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given tag, in document order.
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> + 'n
    where
        'a: 'n,
    {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All descendants (not including `self`) in document order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Descendants with the given tag. The returned nodes borrow `self`
    /// only, not `name`.
    pub fn descendants_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> + 'n
    where
        'a: 'n,
    {
        self.descendants().filter(move |n| n.name == name)
    }

    /// First descendant with the given tag.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        self.descendants().find(|n| n.name == name)
    }

    /// First match for a descendant `path[0]` followed by direct children
    /// `path[1..]`, e.g. `["NombreVotants", "Valeur"]`.
    #[must_use]
    pub fn find_path(&self, path: &[&str]) -> Option<&XmlNode> {
        let (first, rest) = path.split_first()?;
        self.descendants()
            .filter(|n| n.name == *first)
            .find_map(|candidate| rest.iter().try_fold(candidate, |node, name| node.child(name)))
    }

    /// Every text fragment of the subtree (leading text, nested text and tail
    /// text of nested elements) joined by single spaces. Whitespace is not
    /// normalised here.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut pieces = Vec::new();
        self.collect_text(&mut pieces);
        pieces.join(" ")
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(text) = self.text.as_deref() {
            out.push(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = child.tail.as_deref() {
                out.push(tail);
            }
        }
    }
}

/// Pre-order iterator returned by [`XmlNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Parses a payload document into an [`XmlNode`] tree.
///
/// `document` names the payload in error messages. Non-UTF-8 payloads are
/// read as Latin-1, which older publications use.
///
/// # Errors
///
/// Returns [`TransformError::Xml`] for syntax errors reported by the reader
/// (including mismatched end tags) and [`TransformError::Malformed`] when the
/// document has no root element or leaves elements unclosed.
pub fn parse_document(bytes: &[u8], document: &str) -> Result<XmlNode, TransformError> {
    let source = decode_payload(bytes);
    let mut reader = Reader::from_str(&source);

    let xml_err = |source: quick_xml::Error| TransformError::Xml {
        document: document.to_string(),
        source,
    };
    let malformed = |reason: String| TransformError::Malformed {
        document: document.to_string(),
        reason,
    };

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(open_element(&e).map_err(xml_err)?),
            Ok(Event::Empty(e)) => {
                let node = open_element(&e).map_err(xml_err)?;
                close_element(&mut stack, &mut root, node);
            }
            Ok(Event::End(e)) => {
                let node = stack.pop().ok_or_else(|| {
                    malformed(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                close_element(&mut stack, &mut root, node);
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape_with(resolve_entity) {
                    Ok(unescaped) => unescaped.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                push_text(&mut stack, &text);
            }
            Ok(Event::CData(c)) => push_text(&mut stack, &String::from_utf8_lossy(&c)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(source) => return Err(xml_err(source)),
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed("no root element".to_string()))
}

fn decode_payload(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// XML's predefined entities plus the HTML ones found in legacy
/// transcripts. A custom resolver replaces quick-xml's built-in one.
fn resolve_entity(entity: &str) -> Option<&'static str> {
    quick_xml::escape::resolve_predefined_entity(entity).or_else(|| resolve_html_entity(entity))
}

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    let resolved = match entity {
        "nbsp" => "\u{a0}",
        "laquo" => "«",
        "raquo" => "»",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "deg" => "°",
        "euro" => "€",
        "oelig" => "œ",
        "OElig" => "Œ",
        "agrave" => "à",
        "acirc" => "â",
        "ccedil" => "ç",
        "eacute" => "é",
        "egrave" => "è",
        "ecirc" => "ê",
        "euml" => "ë",
        "icirc" => "î",
        "iuml" => "ï",
        "ocirc" => "ô",
        "ugrave" => "ù",
        "ucirc" => "û",
        "uuml" => "ü",
        "Agrave" => "À",
        "Eacute" => "É",
        "Egrave" => "È",
        "Ecirc" => "Ê",
        "Ccedil" => "Ç",
        _ => return None,
    };
    Some(resolved)
}

fn open_element(e: &BytesStart<'_>) -> Result<XmlNode, quick_xml::Error> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value_with(resolve_entity) {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn close_element(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        tracing::debug!(element = %node.name, "ignoring element after document root");
    }
}

fn push_text(stack: &mut [XmlNode], text: &str) {
    let Some(top) = stack.last_mut() else {
        return;
    };
    let slot = match top.children.last_mut() {
        Some(last_child) => &mut last_child.tail,
        None => &mut top.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}
