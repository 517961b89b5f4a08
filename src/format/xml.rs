//! Minimal element tree on top of the quick-xml event reader.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::FormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `true` only for an explicit `key="true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }

    /// First element named `tag`, searching depth-first.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }

    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(tag))
    }

    /// Every element named `tag` in document order.
    pub fn descendants_named<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in &self.children {
            child.descendants_named(tag, out);
        }
    }
}

/// Parse a document into its root element. Text content is dropped.
pub(crate) fn parse_document(text: &str) -> Result<Element, FormatError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FormatError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FormatError::Malformed(format!("<{}> is never closed", open.tag)));
    }
    root.ok_or_else(|| FormatError::Malformed("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), FormatError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(FormatError::Malformed(format!(
                "second root element <{}>",
                element.tag
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_elements_and_attributes() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <a x="1"><b name="n &amp; m"/><c><d/></c></a>"#,
        )
        .unwrap();

        assert_eq!(doc.tag, "a");
        assert_eq!(doc.attr("x"), Some("1"));
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].attr("name"), Some("n & m"));
        assert!(doc.find("d").is_some());
    }

    #[test]
    fn test_rejects_unclosed_element() {
        assert!(parse_document("<a><b></b>").is_err());
    }
}
