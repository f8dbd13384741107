//! Arena -> HTML serialization.

use super::Document;
use super::node::{NodeId, NodeKind};
use crate::utils::html::{escape, escape_attr, is_raw_text_element, is_void_element};

pub(super) fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &mut out);
    out
}

pub(super) fn inner_html(doc: &Document, id: NodeId) -> String {
    let raw = doc.tag_name(id).is_some_and(is_raw_text_element);
    let mut out = String::new();
    for &child in doc.children(id) {
        write_node(doc, child, raw, &mut out);
    }
    out
}

pub(super) fn text_content(doc: &Document, id: NodeId) -> String {
    if let Some(NodeKind::Text(text)) = doc.kind(id) {
        return text.clone();
    }
    doc.descendants(id)
        .into_iter()
        .filter_map(|n| match doc.kind(n) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn write_node(doc: &Document, id: NodeId, raw_text_parent: bool, out: &mut String) {
    let Some(kind) = doc.kind(id) else {
        return;
    };

    match kind {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(doc, child, false, out);
            }
        }
        NodeKind::Text(text) if raw_text_parent => out.push_str(text),
        NodeKind::Text(text) => out.push_str(&escape(text)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            out.push('>');

            if is_void_element(&element.tag) {
                return;
            }

            let raw = is_raw_text_element(&element.tag);
            for &child in doc.children(id) {
                write_node(doc, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}
