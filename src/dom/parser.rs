//! Lenient markup parser
//!
//! Not an HTML5 tree builder. It accepts what authors actually write in
//! templates: void and self-closing tags, quoted, unquoted and bare
//! attributes, comments, doctype, raw-text elements and stray end tags.
//! Text is stored verbatim (no entity decoding) so serialization gives the
//! input back.

use super::{is_void, Document, NodeData, NodeId, RAW_TEXT_ELEMENTS};

/// Tags implicitly closed by an opening tag of the same name
const SELF_NESTING_CLOSES: &[&str] = &["li", "option", "p", "tr", "td", "th", "dt", "dd"];

pub(super) fn parse_into(doc: &mut Document, parent: NodeId, html: &str) {
    let mut stack: Vec<NodeId> = vec![parent];
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(offset) = html[pos..].find('<') {
        let lt = pos + offset;
        let rest = &html[lt..];

        let construct = if rest.starts_with("<!--") {
            Some(Construct::Comment)
        } else if rest.starts_with("</") {
            rest[2..]
                .starts_with(|c: char| c.is_ascii_alphabetic())
                .then_some(Construct::EndTag)
        } else if rest.starts_with("<!") {
            Some(Construct::Declaration)
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            Some(Construct::StartTag)
        } else {
            None
        };

        let Some(construct) = construct else {
            pos = lt + 1;
            continue;
        };

        let current = *stack.last().unwrap_or(&parent);
        flush_text(doc, current, &html[text_start..lt]);

        pos = match construct {
            Construct::Comment => {
                let body = &rest[4..];
                let (content, used) = match body.find("-->") {
                    Some(end) => (&body[..end], 4 + end + 3),
                    None => (body, rest.len()),
                };
                append(doc, current, NodeData::Comment(content.to_string()));
                lt + used
            }
            Construct::Declaration => {
                let end = rest.find('>').map(|e| e + 1).unwrap_or(rest.len());
                let content = rest[2..end].trim_end_matches('>');
                append(doc, current, NodeData::Doctype(content.to_string()));
                lt + end
            }
            Construct::EndTag => {
                let end = rest.find('>').map(|e| e + 1).unwrap_or(rest.len());
                let name = tag_name(&rest[2..]).to_ascii_lowercase();
                close(doc, &mut stack, &name);
                lt + end
            }
            Construct::StartTag => {
                let (tag, used) = start_tag(&rest[1..]);
                let self_closing = tag.self_closing;
                let name = tag.name.clone();

                if SELF_NESTING_CLOSES.contains(&name.as_str())
                    && stack.len() > 1
                    && doc.tag(current) == Some(name.as_str())
                {
                    stack.pop();
                }
                let current = *stack.last().unwrap_or(&parent);
                let element = append(
                    doc,
                    current,
                    NodeData::Element {
                        tag: tag.name,
                        attrs: tag.attrs,
                    },
                );
                let mut next = lt + 1 + used;

                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
                    let body = &html[next..];
                    let end = find_end_tag(body, &name).unwrap_or(body.len());
                    flush_text(doc, element, &body[..end]);
                    next += end;
                    let closing = &html[next..];
                    next += closing.find('>').map(|e| e + 1).unwrap_or(closing.len());
                } else if !is_void(&name) && !self_closing {
                    stack.push(element);
                }
                next
            }
        };
        text_start = pos;
    }

    let current = *stack.last().unwrap_or(&parent);
    flush_text(doc, current, &html[text_start..]);
}

enum Construct {
    Comment,
    Declaration,
    EndTag,
    StartTag,
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

fn append(doc: &mut Document, parent: NodeId, data: NodeData) -> NodeId {
    let id = doc.alloc(data);
    doc.append_child(parent, id);
    id
}

fn flush_text(doc: &mut Document, parent: NodeId, text: &str) {
    if !text.is_empty() {
        append(doc, parent, NodeData::Text(text.to_string()));
    }
}

fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}

/// Pop open elements up to and including the nearest `name`; ignore stray end tags
fn close(doc: &Document, stack: &mut Vec<NodeId>, name: &str) {
    if let Some(depth) = stack
        .iter()
        .skip(1)
        .rposition(|n| doc.tag(*n) == Some(name))
    {
        stack.truncate(depth + 1);
    }
}

/// Offset of `</name` (case-insensitive) in a raw-text body
fn find_end_tag(body: &str, name: &str) -> Option<usize> {
    let lower = body.to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut from = 0;
    while let Some(i) = lower[from..].find(&needle) {
        let at = from + i;
        let after = lower[at + needle.len()..].chars().next();
        if after.map_or(true, |c| c == '>' || c == '/' || c.is_whitespace()) {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

/// Parse `name attr=... >` (input starts right after `<`); returns the tag and bytes consumed
fn start_tag(s: &str) -> (StartTag, usize) {
    let name = tag_name(s);
    let mut tag = StartTag {
        name: name.to_ascii_lowercase(),
        attrs: Vec::new(),
        self_closing: false,
    };
    let bytes = s.as_bytes();
    let mut i = name.len();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return (tag, s.len());
        }
        match bytes[i] {
            b'>' => return (tag, i + 1),
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    tag.self_closing = true;
                    return (tag, i + 2);
                }
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>')
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let attr_name = s[name_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = String::new();
        if bytes.get(j) == Some(&b'=') {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match bytes.get(j) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let body = &s[j + 1..];
                    let end = body.find(q as char).unwrap_or(body.len());
                    value = body[..end].to_string();
                    i = (j + 1 + end + 1).min(s.len());
                }
                _ => {
                    let start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = s[start..j].to_string();
                    i = j;
                }
            }
        }

        if !attr_name.is_empty() && !tag.attrs.iter().any(|(n, _)| *n == attr_name) {
            tag.attrs.push((attr_name, value));
        }
    }
}
