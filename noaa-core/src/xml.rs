//! Minimal navigable element tree over `quick-xml` pull events.
//!
//! NOAA's feeds are small and shallow, so building the full tree up front is
//! simpler than threading parser state through every consumer.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use crate::error::{NoaaError, Result};

/// Decode raw feed bytes using the encoding named in the XML declaration.
///
/// Observation documents are declared ISO-8859-1. Without a declaration the
/// bytes are taken as UTF-8, the XML default.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let declared = match reader.read_event_into(&mut buf) {
        Ok(Event::Decl(decl)) => decl.encoder(),
        _ => None,
    };

    match declared {
        Some(encoding) => {
            let (text, malformed) = encoding.decode_with_bom_removal(bytes);
            if malformed {
                tracing::warn!(encoding = encoding.name(), "replaced undecodable bytes");
            }
            text
        }
        None => String::from_utf8_lossy(bytes),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name, namespace prefix stripped.
    pub name: String,
    /// Qualified attribute names (e.g. `xsi:nil`) with unescaped values.
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(open(&start, reader.decoder())?),
                Event::Empty(start) => {
                    let elem = open(&start, reader.decoder())?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::End(_) => {
                    let elem = stack.pop().ok_or_else(|| {
                        NoaaError::MalformedDocument("unexpected closing tag".into())
                    })?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = stack.last() {
            return Err(NoaaError::MalformedDocument(format!(
                "element <{}> is never closed",
                unclosed.name
            )));
        }

        root.ok_or_else(|| NoaaError::MalformedDocument("document has no root element".into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `xsi:nil="true"` marks a value the producer knows it doesn't have.
    pub fn is_nil(&self) -> bool {
        self.attr("xsi:nil") == Some("true")
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child named `name`. Empty text counts as absent.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// All descendants named `name`, depth-first in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect(self, name, &mut found);
        found
    }
}

fn collect<'a>(elem: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &elem.children {
        if child.name == name {
            found.push(child);
        }
        collect(child, name, found);
    }
}

fn open(start: &BytesStart<'_>, decoder: Decoder) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, elem: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(elem),
        None if root.is_none() => *root = Some(elem),
        None => {
            return Err(NoaaError::MalformedDocument(
                "document has more than one root element".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
            <dwml version="1.0">
              <data>
                <temperature type="maximum" time-layout="k-p24h-n3-1">
                  <value>75</value>
                  <value xsi:nil="true"/>
                </temperature>
              </data>
            </dwml>"#;

        let root = Element::parse(doc).unwrap();
        assert_eq!(root.name, "dwml");
        assert_eq!(root.attr("version"), Some("1.0"));

        let temps = root.descendants("temperature");
        assert_eq!(temps.len(), 1);
        assert_eq!(temps[0].attr("time-layout"), Some("k-p24h-n3-1"));

        let values: Vec<_> = temps[0].children("value").collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].text, "75");
        assert!(values[1].is_nil());
    }

    #[test]
    fn decodes_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<station_name>Cura\xe7ao</station_name>";

        let text = decode_document(bytes);
        let root = Element::parse(&text).unwrap();

        assert_eq!(root.text, "Cura\u{e7}ao");
    }

    #[test]
    fn undeclared_documents_are_utf8() {
        let bytes = "<station_name>Curaçao</station_name>".as_bytes();
        assert_eq!(decode_document(bytes), "<station_name>Curaçao</station_name>");
    }

    #[test]
    fn unescapes_text_and_treats_blank_as_absent() {
        let root = Element::parse(
            "<current_observation><location>Austin &amp; Bergstrom</location><weather>  </weather></current_observation>",
        )
        .unwrap();

        assert_eq!(root.child_text("location"), Some("Austin & Bergstrom"));
        assert_eq!(root.child_text("weather"), None);
        assert_eq!(root.child_text("temp_f"), None);
    }

    #[test]
    fn strips_namespace_prefix_from_element_names() {
        let root = Element::parse(r#"<ns:root xmlns:ns="urn:x"><ns:item/></ns:root>"#).unwrap();
        assert_eq!(root.name, "root");
        assert!(root.child("item").is_some());
    }

    #[test]
    fn unclosed_element_is_malformed() {
        let err = Element::parse("<wx_station_index><station>").unwrap_err();
        assert!(matches!(err, NoaaError::MalformedDocument(_) | NoaaError::Xml(_)));
    }

    #[test]
    fn empty_document_is_malformed() {
        let err = Element::parse("").unwrap_err();
        assert!(matches!(err, NoaaError::MalformedDocument(_)));
    }
}
