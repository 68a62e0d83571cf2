//! Markup tree used for every in-place rewrite
//!
//! Parts are parsed with `quick_xml` into an [`XmlTree`], edited through
//! node handles, and serialized back. Qualified names are kept verbatim
//! (`w:p`, `c:ser`), so lookups match on the prefix the package uses.

mod tree;

pub use tree::{Element, NodeId, NodeKind, XmlTree};

use std::io::BufRead;

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{Error, Result};

/// Parse a part into a tree
///
/// `part` only labels errors.
pub fn parse(part: &str, bytes: &[u8]) -> Result<XmlTree> {
    parse_reader(part, bytes)
}

fn parse_reader<R: BufRead>(part: &str, input: R) -> Result<XmlTree> {
    let xml_err = |source| Error::Xml {
        part: part.to_string(),
        source,
    };

    let mut reader = Reader::from_reader(input);
    let mut tree = XmlTree::new();
    let mut stack = vec![tree.document()];
    let mut buf = Vec::new();

    loop {
        let parent = match stack.last() {
            Some(&p) => p,
            None => return Err(Error::markup(part, "unbalanced end tag")),
        };
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = element_from(part, e)?;
                let id = tree.append_element(parent, element);
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from(part, e)?;
                tree.append_element(parent, element);
            }
            Ok(Event::End(_)) => {
                if stack.len() <= 1 {
                    return Err(Error::markup(part, "unbalanced end tag"));
                }
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(xml_err)?;
                tree.append_text(parent, text.into_owned());
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e).into_owned();
                let id = tree.create(NodeKind::CData(text));
                tree.append_child(parent, id);
            }
            Ok(Event::Comment(ref e)) => {
                let raw = String::from_utf8_lossy(e).into_owned();
                let id = tree.create(NodeKind::Comment(raw));
                tree.append_child(parent, id);
            }
            Ok(Event::Decl(ref e)) => {
                let raw = String::from_utf8_lossy(e).into_owned();
                let id = tree.create(NodeKind::Declaration(raw));
                tree.append_child(parent, id);
            }
            Ok(Event::PI(ref e)) => {
                let raw = String::from_utf8_lossy(e).into_owned();
                let id = tree.create(NodeKind::ProcessingInstruction(raw));
                tree.append_child(parent, id);
            }
            Ok(Event::DocType(ref e)) => {
                let raw = String::from_utf8_lossy(e).into_owned();
                let id = tree.create(NodeKind::DocType(raw));
                tree.append_child(parent, id);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(Error::markup(part, "unclosed element at end of input"));
    }
    Ok(tree)
}

fn element_from(part: &str, e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Xml {
            part: part.to_string(),
            source: err.into(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|source| Error::Xml {
            part: part.to_string(),
            source,
        })?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Serialize a tree back to bytes
///
/// Elements without children are written in their empty form.
pub fn to_bytes(tree: &XmlTree) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for &child in tree.children(tree.document()) {
        write_node(tree, child, &mut writer)?;
    }
    Ok(writer.into_inner())
}

fn write_node(tree: &XmlTree, node: NodeId, writer: &mut Writer<Vec<u8>>) -> Result<()> {
    let xml_err = |source| Error::Xml {
        part: String::from("<output>"),
        source,
    };

    match tree.kind(node) {
        NodeKind::Document => {
            for &child in tree.children(node) {
                write_node(tree, child, writer)?;
            }
        }
        NodeKind::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for (key, value) in &element.attrs {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            let children = tree.children(node);
            if children.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(xml_err)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                for &child in children {
                    write_node(tree, child, writer)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(element.name.as_str())))
                    .map_err(xml_err)?;
            }
        }
        NodeKind::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?;
        }
        NodeKind::CData(text) => {
            writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(xml_err)?;
        }
        NodeKind::Comment(raw) => push_raw(writer, "<!--", raw, "-->"),
        NodeKind::Declaration(raw) => push_raw(writer, "<?", raw, "?>"),
        NodeKind::ProcessingInstruction(raw) => push_raw(writer, "<?", raw, "?>"),
        NodeKind::DocType(raw) => push_raw(writer, "<!DOCTYPE ", raw, ">"),
    }
    Ok(())
}

fn push_raw(writer: &mut Writer<Vec<u8>>, open: &str, raw: &str, close: &str) {
    let out = writer.get_mut();
    out.extend_from_slice(open.as_bytes());
    out.extend_from_slice(raw.as_bytes());
    out.extend_from_slice(close.as_bytes());
}

/// Local part of a qualified name (`w:p` -> `p`)
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}
