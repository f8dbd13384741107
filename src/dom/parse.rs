//! HTML -> arena conversion on top of `tl`.

use std::borrow::Cow;

use super::Document;
use super::node::{ElementData, NodeId, NodeKind};
use crate::utils::html::{is_raw_text_element, unescape};

/// Parse `html` and allocate its top-level nodes (detached) in `doc`.
pub(super) fn parse_nodes(doc: &mut Document, html: &str) -> Vec<NodeId> {
    if html.is_empty() {
        return Vec::new();
    }

    // tl reads markup inside <script>/<style>; set their bodies aside first
    let (masked, bodies) = mask_raw_text(html);
    let Ok(dom) = tl::parse(&masked, tl::ParserOptions::default()) else {
        // Unparseable input degrades to a single text node
        return vec![doc.alloc(NodeKind::Text(html.to_string()))];
    };

    let ctx = Context {
        parser: dom.parser(),
        bodies: &bodies,
    };
    dom.children()
        .iter()
        .filter_map(|handle| convert(doc, *handle, &ctx, false))
        .collect()
}

struct Context<'p, 'a> {
    parser: &'p tl::Parser<'a>,
    bodies: &'p [String],
}

// =============================================================================
// Raw text masking
// =============================================================================

/// Delimits the index of a masked body. Private use, never emitted by pyfron.
const RAW_MARK: char = '\u{E000}';

const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

/// Replace each `<script>`/`<style>` body with an indexed marker.
///
/// Returns the masked input and the bodies in order. A body runs to the
/// first matching close tag, or to the end of input.
fn mask_raw_text(html: &str) -> (Cow<'_, str>, Vec<String>) {
    // ASCII lowercasing keeps byte offsets
    let lower = html.to_ascii_lowercase();
    let mut masked = String::new();
    let mut bodies = Vec::new();
    let mut copied = 0;
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find('<') {
        let start = pos + rel;
        let rest = &lower[start + 1..];

        if rest.starts_with("!--") {
            pos = rest.find("-->").map_or(lower.len(), |i| start + 1 + i + 3);
            continue;
        }

        let Some(tag) = RAW_TEXT_TAGS.into_iter().find(|tag| {
            rest.strip_prefix(*tag)
                .and_then(|after| after.chars().next())
                .is_some_and(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
        }) else {
            pos = start + 1;
            continue;
        };

        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        if lower[..open_end].ends_with("/>") {
            pos = open_end;
            continue;
        }

        let close = format!("</{tag}");
        let body_end = lower[open_end..]
            .find(&close)
            .map_or(lower.len(), |i| open_end + i);
        if body_end > open_end {
            masked.push_str(&html[copied..open_end]);
            masked.push(RAW_MARK);
            masked.push_str(&bodies.len().to_string());
            masked.push(RAW_MARK);
            bodies.push(html[open_end..body_end].to_string());
            copied = body_end;
        }
        pos = body_end;
    }

    if bodies.is_empty() {
        return (Cow::Borrowed(html), bodies);
    }
    masked.push_str(&html[copied..]);
    (Cow::Owned(masked), bodies)
}

fn unmask<'b>(text: &str, bodies: &'b [String]) -> Option<&'b str> {
    let index = text.strip_prefix(RAW_MARK)?.strip_suffix(RAW_MARK)?;
    bodies.get(index.parse::<usize>().ok()?).map(String::as_str)
}

// =============================================================================
// Attribute order
// =============================================================================

/// Attribute names of an open tag, in source order.
fn attribute_names(source: &str) -> Vec<&str> {
    let mut names = Vec::new();
    // Skip `<` and the tag name
    let mut rest = source
        .trim_start_matches('<')
        .trim_start_matches(|c: char| !c.is_ascii_whitespace() && c != '>' && c != '/');

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() || rest.starts_with('>') {
            break;
        }

        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        names.push(&rest[..name_len]);
        rest = rest[name_len..].trim_start();

        let Some(value) = rest.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        rest = match value.chars().next() {
            Some(quote @ ('"' | '\'')) => value[1..]
                .find(quote)
                .map_or("", |i| &value[i + 2..]),
            _ => {
                let end = value
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(value.len());
                &value[end..]
            }
        };
    }
    names
}

// =============================================================================
// Conversion
// =============================================================================

fn convert(
    doc: &mut Document,
    handle: tl::NodeHandle,
    ctx: &Context<'_, '_>,
    raw_text_parent: bool,
) -> Option<NodeId> {
    let node = handle.get(ctx.parser)?;

    match node {
        tl::Node::Tag(tag) => {
            let tag_name = tag.name().as_utf8_str().to_ascii_lowercase();
            // <!DOCTYPE ...> carries nothing the runtime needs
            if tag_name.starts_with('!') {
                return None;
            }

            let attributes = tag.attributes();
            let mut parsed: Vec<(String, String)> = attributes
                .iter()
                .map(|(key, value)| {
                    let value = value.map(|v| unescape(&v).into_owned());
                    (key.into_owned(), value.unwrap_or_default())
                })
                .collect();
            // `iter()` leaves out id and class
            for special in ["id", "class"] {
                if !parsed.iter().any(|(k, _)| k.eq_ignore_ascii_case(special))
                    && let Some(Some(value)) = attributes.get(special)
                {
                    let value = unescape(&value.as_utf8_str()).into_owned();
                    parsed.push((special.to_string(), value));
                }
            }

            let source = tag.raw().as_utf8_str();
            let mut data = ElementData::new(tag_name);
            for name in attribute_names(&source) {
                if let Some(i) = parsed.iter().position(|(k, _)| k.eq_ignore_ascii_case(name)) {
                    let (key, value) = parsed.remove(i);
                    data.set(&key, value);
                }
            }
            for (key, value) in parsed {
                data.set(&key, value);
            }

            let raw = is_raw_text_element(&data.tag);
            let id = doc.alloc(NodeKind::Element(data));
            for child_handle in tag.children().top().iter() {
                if let Some(child) = convert(doc, *child_handle, ctx, raw) {
                    doc.append_child(id, child);
                }
            }
            Some(id)
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if text.is_empty() {
                return None;
            }
            let text = if raw_text_parent {
                unmask(&text, ctx.bodies)
                    .map(str::to_string)
                    .unwrap_or_else(|| text.into_owned())
            } else {
                unescape(&text).into_owned()
            };
            Some(doc.alloc(NodeKind::Text(text)))
        }
        tl::Node::Comment(bytes) => {
            let raw = bytes.as_utf8_str();
            let body = raw
                .strip_prefix("<!--")
                .and_then(|s| s.strip_suffix("-->"))
                .unwrap_or(raw.as_ref());
            Some(doc.alloc(NodeKind::Comment(body.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    #[test]
    fn test_entities_decoded_in_text_and_attrs() {
        let doc = Document::parse(r#"<p title="a &amp; b">x &lt; y</p>"#);
        let p = doc.find_element(|e| e.tag == "p").unwrap();
        assert_eq!(doc.get_attribute(p, "title"), Some("a & b"));
        assert_eq!(doc.text_content(p), "x < y");
    }

    #[test]
    fn test_script_text_kept_raw() {
        let doc = Document::parse("<script>let a = 1 &amp;&amp; 2;</script>");
        let script = doc.find_element(|e| e.tag == "script").unwrap();
        assert_eq!(doc.text_content(script), "let a = 1 &amp;&amp; 2;");
    }

    const SUPPORT_SCRIPT: &str = "<script>function onClickListener(id){ \
        for(let i = 0; i < actual.children.length; i++ ) { if (a<b) { g('<div>'); } } }</script>";

    #[test]
    fn test_script_body_not_parsed_as_markup() {
        let html = format!(
            "<html><head><script>let page_props = {{'n': 1}}; </script>{SUPPORT_SCRIPT}</head>\
             <body><div class=\"after\" elemid=\"0-0\">z</div></body></html>"
        );
        let doc = Document::parse(&html);

        let scripts: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.tag_name(n) == Some("script"))
            .collect();
        assert_eq!(scripts.len(), 2);
        assert_eq!(doc.text_content(scripts[0]), "let page_props = {'n': 1}; ");
        assert!(doc.text_content(scripts[1]).contains("i < actual.children.length"));
        assert!(doc.element_children(scripts[1]).is_empty());

        let after = doc.find_by_target_id("after").unwrap();
        assert_eq!(doc.tag_name(doc.parent(after).unwrap()), Some("body"));
        assert!(doc.to_html().contains(SUPPORT_SCRIPT));
    }

    #[test]
    fn test_style_and_unclosed_script() {
        let doc = Document::parse("<style>a > b { x: 1 }</style><p>ok</p><script>if (a < b)");
        let style = doc.find_element(|e| e.tag == "style").unwrap();
        assert_eq!(doc.text_content(style), "a > b { x: 1 }");
        let p = doc.find_element(|e| e.tag == "p").unwrap();
        assert_eq!(doc.text_content(p), "ok");
        let script = doc.find_element(|e| e.tag == "script").unwrap();
        assert_eq!(doc.text_content(script), "if (a < b)");
    }

    #[test]
    fn test_script_inside_comment_left_alone() {
        let (masked, bodies) = mask_raw_text("<!-- <script>x</script> --><p>y</p>");
        assert!(matches!(masked, Cow::Borrowed(_)));
        assert!(bodies.is_empty());
    }

    #[test]
    fn test_attribute_source_order() {
        let doc = Document::parse(r#"<div class="g" elemid="1" id="x" onclick='f("a b")'>t</div>"#);
        let div = doc.find_element(|e| e.tag == "div").unwrap();
        let names: Vec<_> = doc
            .element(div)
            .unwrap()
            .attrs
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(names, ["class", "elemid", "id", "onclick"]);
        assert!(doc.to_html().starts_with(r#"<div class="g" elemid="1" id="x""#));
    }

    #[test]
    fn test_attribute_names_scanner() {
        assert_eq!(
            attribute_names(r#"<input disabled value = "a>b" key=k/>"#),
            ["disabled", "value", "key"]
        );
        assert!(attribute_names("<br/>").is_empty());
    }

    #[test]
    fn test_nested_structure() {
        let mut doc = Document::new();
        let frag = doc.parse_fragment(r#"<form><div><label><input class="f" /></label></div></form>"#);
        assert_eq!(frag.nodes.len(), 1);
        let form = frag.nodes[0];
        let div = doc.element_children(form)[0];
        let label = doc.element_children(div)[0];
        let input = doc.element_children(label)[0];
        assert_eq!(doc.tag_name(input), Some("input"));
        assert_eq!(doc.get_attribute(input, "class"), Some("f"));
    }
}
