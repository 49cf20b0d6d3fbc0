//! Markup serialization

use super::{is_void, Document, NodeData, NodeId};

pub(super) fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let Some(data) = doc.data(id) else {
        return;
    };
    match data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeData::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(text),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Doctype(text) => {
            out.push_str("<!");
            out.push_str(text);
            out.push('>');
        }
    }
}
