use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{ErrorKind, IResult};
use crate::xml::{self, Document};

/// Load the special voice-over tags from `special_voices.xml`.
pub fn load_voice_tags(path: &Path) -> IResult<BTreeSet<String>> {
    let tags = voice_tags_from_document(&xml::parse_file(path)?)?;
    info!(count = tags.len(), path = %path.display(), "loaded voice tags");
    Ok(tags)
}

/// Collect the trimmed `<tag>` of every entry under `<voiceover>`.
pub fn voice_tags_from_document(doc: &Document) -> IResult<BTreeSet<String>> {
    let root = doc.root();
    let voiceover = root
        .child("voiceover")
        .ok_or_else(|| ErrorKind::MissingElement {
            parent: root.name().to_string(),
            element: "voiceover".to_string(),
        })?;

    let mut tags = BTreeSet::new();
    for entry in voiceover.children() {
        match entry.child_text("tag").map(str::trim) {
            Some(tag) if !tag.is_empty() => {
                tags.insert(tag.to_string());
            }
            _ => warn!(entry = entry.name(), "voice-over entry has no tag"),
        }
    }

    Ok(tags)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_collects_trimmed_tags() {
        let doc = xml::parse(
            "<special_voices.xml>
                <voiceover>
                    <buffon><tag> buffonVoice </tag></buffon>
                    <sabaton><tag>sabatonVoice</tag></sabaton>
                    <duplicate><tag>sabatonVoice</tag></duplicate>
                    <broken/>
                </voiceover>
            </special_voices.xml>",
        );
        let tags = voice_tags_from_document(&doc).unwrap();
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            ["buffonVoice", "sabatonVoice"]
        );
    }

    #[test]
    fn test_missing_voiceover_is_an_error() {
        let doc = xml::parse("<special_voices.xml><other/></special_voices.xml>");
        assert!(matches!(
            voice_tags_from_document(&doc),
            Err(ErrorKind::MissingElement { .. })
        ));
    }
}
