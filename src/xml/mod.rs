//! Span-annotated XML trees for the game's `.xml` resources.
//!
//! Game files are not always well formed, so [`parse`] never fails: a strict
//! `roxmltree` parse is attempted first and a recovering `quick-xml` pass
//! salvages what it can when that fails. Every element remembers the byte
//! range it came from, which lets [`TextEdits`] rewrite individual text runs
//! while leaving the rest of the source untouched.

mod recover;
mod strict;

use std::ops::Range;
use std::path::Path;

use quick_xml::escape::partial_escape;
use tracing::warn;

use crate::error::IResult;

/// The decoded leading text of an element along with its raw source range.
#[derive(Debug, Clone)]
pub(crate) struct Text {
    span: Range<usize>,
    value: String,
}

#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    span: Range<usize>,
    /// Offset right after the start tag. `None` for `<empty/>` elements.
    content_start: Option<usize>,
    text: Option<Text>,
    children: Vec<Element>,
}

impl Element {
    /// Placeholder root for documents where nothing could be salvaged.
    fn synthetic() -> Self {
        Self {
            name: String::new(),
            span: 0..0,
            content_start: None,
            text: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the whole element (start tag through end tag) in the source.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Text directly following the start tag, before any child node.
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().map(|text| text.value.as_str())
    }

    /// Child elements in document order. Comments and processing instructions are not included.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)?.text()
    }
}

/// A parsed document that owns its source text.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    root: Element,
    recovered: bool,
}

impl Document {
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the strict parse failed and the tree came from the recovering parser.
    pub fn is_recovered(&self) -> bool {
        self.recovered
    }

    pub fn edit(&self) -> TextEdits<'_> {
        TextEdits {
            document: self,
            edits: Vec::new(),
        }
    }
}

/// Parse XML text, recovering from malformed input instead of failing.
pub fn parse(text: &str) -> Document {
    match strict::parse(text) {
        Ok(root) => Document {
            source: text.to_string(),
            root,
            recovered: false,
        },
        Err(err) => {
            warn!(%err, "strict XML parse failed, recovering what we can");
            Document {
                source: text.to_string(),
                root: recover::parse(text).unwrap_or_else(Element::synthetic),
                recovered: true,
            }
        }
    }
}

/// Read and parse an XML file. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_file(path: &Path) -> IResult<Document> {
    let data = std::fs::read(path)?;
    Ok(parse(&String::from_utf8_lossy(&data)))
}

/// Pending text replacements against a [`Document`]'s source.
pub struct TextEdits<'doc> {
    document: &'doc Document,
    edits: Vec<(Range<usize>, String)>,
}

impl TextEdits<'_> {
    /// Replace the leading text of `element`, which must belong to this document.
    pub fn set_text(&mut self, element: &Element, value: &str) {
        let escaped = partial_escape(value);
        match (&element.text, element.content_start) {
            (Some(text), _) => self.edits.push((text.span.clone(), escaped.into_owned())),
            (None, Some(start)) => self.edits.push((start..start, escaped.into_owned())),
            (None, None) => {
                // <name attr="..."/> becomes <name attr="...">value</name>
                let source = &self.document.source[element.span()];
                let open = source.strip_suffix("/>").unwrap_or(source).trim_end();
                let raw_name: String = open
                    .trim_start_matches('<')
                    .chars()
                    .take_while(|c| !c.is_whitespace())
                    .collect();
                self.edits
                    .push((element.span(), format!("{open}>{escaped}</{raw_name}>")));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Splice all edits into a copy of the source.
    pub fn apply(mut self) -> String {
        let source = self.document.source.as_str();
        self.edits.sort_by_key(|(range, _)| (range.start, range.end));

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for (range, replacement) in self.edits {
            if range.start < cursor {
                warn!(?range, "dropping overlapping XML edit");
                continue;
            }
            out.push_str(&source[cursor..range.start]);
            out.push_str(&replacement);
            cursor = range.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GROUPS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<usa.xml>
  <premiumGroups>
    <alpha>
      <tags> v1 other </tags>
      <firstNames><name>#usa_tankmen:alpha_first</name></firstNames>
      <icons><icon/></icons>
    </alpha>
  </premiumGroups>
</usa.xml>
"#;

    #[test]
    fn test_strict_tree() {
        let doc = parse(GROUPS);
        assert!(!doc.is_recovered());
        assert_eq!(doc.root().name(), "usa.xml");

        let alpha = doc
            .root()
            .child("premiumGroups")
            .and_then(|groups| groups.first_child())
            .unwrap();
        assert_eq!(alpha.name(), "alpha");
        assert_eq!(alpha.child_text("tags"), Some(" v1 other "));
        assert_eq!(
            alpha.child("firstNames").unwrap().first_child().unwrap().text(),
            Some("#usa_tankmen:alpha_first")
        );
        assert_eq!(&doc.source()[alpha.span()][..7], "<alpha>");
    }

    #[test]
    fn test_no_edits_is_identity() {
        let doc = parse(GROUPS);
        assert_eq!(doc.edit().apply(), GROUPS);
    }

    #[test]
    fn test_edits_touch_only_text() {
        let doc = parse(GROUPS);
        let alpha = doc.root().child("premiumGroups").unwrap().child("alpha").unwrap();

        let mut edits = doc.edit();
        edits.set_text(alpha.child("tags").unwrap(), "v2 & more");
        edits.set_text(alpha.child("icons").unwrap().first_child().unwrap(), "beta.png");
        let out = edits.apply();

        assert!(out.contains("<tags>v2 &amp; more</tags>"));
        assert!(out.contains("<icons><icon>beta.png</icon></icons>"));
        assert_eq!(
            out.replace("<tags>v2 &amp; more</tags>", "<tags> v1 other </tags>")
                .replace("<icon>beta.png</icon>", "<icon/>"),
            GROUPS
        );

        let reparsed = parse(&out);
        let alpha = reparsed.root().child("premiumGroups").unwrap().child("alpha").unwrap();
        assert_eq!(alpha.child_text("tags"), Some("v2 & more"));
    }

    #[test]
    fn test_set_text_on_empty_pair() {
        let doc = parse("<root><a></a><b attr=\"x\" /></root>");
        let mut edits = doc.edit();
        edits.set_text(doc.root().child("a").unwrap(), "one");
        edits.set_text(doc.root().child("b").unwrap(), "two");
        assert_eq!(edits.apply(), "<root><a>one</a><b attr=\"x\">two</b></root>");
    }

    #[test]
    fn test_entities_are_decoded() {
        let doc = parse("<root><a>fish &amp; chips</a></root>");
        assert_eq!(doc.root().child_text("a"), Some("fish & chips"));
    }

    #[test]
    fn test_recovers_mismatched_tags() {
        let text = "<root><premiumGroups><alpha><tags>v1</tags></beta></alpha><gamma><tags>v2</tags></gamma></premiumGroups></root>";
        let doc = parse(text);
        assert!(doc.is_recovered());

        let groups = doc.root().child("premiumGroups").unwrap();
        let names: Vec<_> = groups.children().map(Element::name).collect();
        assert_eq!(names, ["alpha", "gamma"]);
        assert_eq!(groups.child("gamma").unwrap().child_text("tags"), Some("v2"));
        assert_eq!(doc.edit().apply(), text);
    }

    #[test]
    fn test_recovers_truncated_document() {
        let doc = parse("<root><premiumGroups><alpha><tags>v1</tags></alpha><beta><tags>v2");
        assert!(doc.is_recovered());
        let groups = doc.root().child("premiumGroups").unwrap();
        assert_eq!(groups.child("alpha").unwrap().child_text("tags"), Some("v1"));
        assert!(groups.child("beta").is_some());
    }

    #[test]
    fn test_recovers_cdata_text() {
        let text = "<root><premiumGroups><alpha><tags><![CDATA[v1 <x>]]></tags></oops></alpha></premiumGroups></root>";
        let doc = parse(text);
        assert!(doc.is_recovered());

        let tags = doc.root().child("premiumGroups").unwrap().child("alpha").unwrap().child("tags").unwrap();
        assert_eq!(tags.text(), Some("v1 <x>"));

        let mut edits = doc.edit();
        edits.set_text(tags, "v2");
        assert_eq!(edits.apply(), text.replace("<![CDATA[v1 <x>]]>", "v2"));
    }

    #[test]
    fn test_garbage_yields_empty_root() {
        let doc = parse("this is not xml at all");
        assert!(doc.is_recovered());
        assert_eq!(doc.root().children().count(), 0);
        assert!(doc.root().child("premiumGroups").is_none());
    }
}
