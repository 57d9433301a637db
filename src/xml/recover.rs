//! Best-effort tree building for documents `roxmltree` rejects.
//!
//! End tags are matched against the nearest open element with the same name,
//! implicitly closing anything opened after it. End tags with no open
//! counterpart are dropped. On a syntax error or EOF everything still open is
//! closed at the last good position.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use tracing::{debug, warn};

use super::{Element, Text};

#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    closed: Vec<Element>,
}

impl TreeBuilder {
    fn attach(&mut self, element: Element) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.closed.push(element),
        }
    }

    fn close(&mut self, end: usize) {
        if let Some(mut element) = self.open.pop() {
            element.span.end = end;
            self.attach(element);
        }
    }
}

/// Returns the first top-level element, or `None` if no element was found.
pub(super) fn parse(source: &str) -> Option<Element> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(false);
    reader.check_end_names(false);

    let mut tree = TreeBuilder::default();
    // End of the last event we trust the position of.
    let mut cursor = 0;

    loop {
        let event = reader.read_event();
        let position = reader.buffer_position();

        match event {
            Ok(Event::Start(start)) => {
                tree.open.push(Element {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    span: tag_start(source, cursor, position)..position,
                    content_start: Some(position),
                    text: None,
                    children: Vec::new(),
                });
            }
            Ok(Event::Empty(start)) => {
                let element = Element {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    span: tag_start(source, cursor, position)..position,
                    content_start: None,
                    text: None,
                    children: Vec::new(),
                };
                tree.attach(element);
            }
            Ok(Event::End(end)) => {
                let name = end.name();
                let matching = tree
                    .open
                    .iter()
                    .rposition(|element| element.name.as_bytes() == name.as_ref());
                match matching {
                    Some(index) => {
                        let end_tag_start = tag_start(source, cursor, position);
                        while tree.open.len() > index + 1 {
                            tree.close(end_tag_start);
                        }
                        tree.close(position);
                    }
                    None => debug!(
                        name = %String::from_utf8_lossy(name.as_ref()),
                        position,
                        "ignoring stray end tag"
                    ),
                }
            }
            Ok(Event::Text(_)) => {
                // The reader may already have consumed the `<` that ends this run,
                // so the end is located in the source instead.
                let end = source[cursor..]
                    .find('<')
                    .map_or(source.len(), |offset| cursor + offset);
                if let Some(parent) = tree.open.last_mut()
                    && parent.text.is_none()
                    && parent.children.is_empty()
                    && parent.content_start == Some(cursor)
                {
                    let raw = &source[cursor..end];
                    parent.text = Some(Text {
                        span: cursor..end,
                        value: unescape(raw)
                            .map(Cow::into_owned)
                            .unwrap_or_else(|_| raw.to_string()),
                    });
                }
                cursor = end;
                continue;
            }
            Ok(Event::CData(cdata)) => {
                if let Some(parent) = tree.open.last_mut()
                    && parent.text.is_none()
                    && parent.children.is_empty()
                    && parent.content_start == Some(cursor)
                {
                    // The span covers the whole section so an edit replaces it.
                    parent.text = Some(Text {
                        span: cursor..position,
                        value: String::from_utf8_lossy(&cdata).into_owned(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(position = cursor, %err, "abandoning malformed XML");
                break;
            }
        }

        cursor = position;
    }

    while !tree.open.is_empty() {
        tree.close(cursor);
    }

    tree.closed.into_iter().next()
}

/// Start offset of the tag ending at `end`. Tags cannot contain a raw `<`.
fn tag_start(source: &str, cursor: usize, end: usize) -> usize {
    source[..end].rfind('<').unwrap_or(cursor)
}
