use roxmltree::{Node, ParsingOptions};

use super::{Element, Text};

pub(super) fn parse(source: &str) -> Result<Element, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(source, options)?;
    Ok(build(doc.root_element(), source))
}

fn build(node: Node<'_, '_>, source: &str) -> Element {
    let span = node.range();
    let first = node.first_child();

    let text = first.filter(|child| child.is_text()).map(|child| Text {
        span: child.range(),
        value: child.text().unwrap_or_default().to_string(),
    });

    let content_start = match first {
        Some(child) => Some(child.range().start),
        None => {
            let raw = &source[span.clone()];
            if raw.ends_with("/>") {
                None
            } else {
                raw.rfind("</").map(|offset| span.start + offset)
            }
        }
    };

    Element {
        name: node.tag_name().name().to_string(),
        span,
        content_start,
        text,
        children: node
            .children()
            .filter(|child| child.is_element())
            .map(|child| build(child, source))
            .collect(),
    }
}
