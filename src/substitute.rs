use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ErrorKind, IResult};
use crate::tankmen::{PREMIUM_GROUPS, Roster};
use crate::xml::{self, Element, TextEdits};

/// Rewrite `nation`'s document so each source slug in `mapping` takes on the
/// identity of its target.
///
/// The stored document is parsed fresh for every call, so results never depend
/// on earlier substitutions. Only the text of `<tags>` and of the first entry
/// in `<firstNames>`, `<lastNames>` and `<icons>` changes; everything else is
/// returned exactly as read.
pub fn substitute(roster: &Roster, nation: &str, mapping: &BTreeMap<String, String>) -> IResult<String> {
    let source_text = roster
        .document(nation)
        .ok_or_else(|| ErrorKind::UnknownNation(nation.to_string()))?;
    let doc = xml::parse(source_text);

    let Some(groups) = doc.root().child(PREMIUM_GROUPS) else {
        return Ok(source_text.to_string());
    };

    let mut edits = doc.edit();
    for record in groups.children() {
        let Some(target_slug) = mapping.get(record.name()) else {
            continue;
        };

        let (Some(source), Some(target)) = (roster.tankman(record.name()), roster.tankman(target_slug))
        else {
            debug!(nation, source = record.name(), target = %target_slug, "unknown tankman in mapping");
            continue;
        };
        let Some(target_data) = target.nation_data.get(nation) else {
            debug!(nation, target = %target_slug, "target has no data for nation");
            continue;
        };

        if let Some(tags) = record.child("tags") {
            edits.set_text(
                tags,
                &target_data.tags.replace(&source.voice_tag, &target.voice_tag),
            );
        }
        set_first_entry(&mut edits, record, "firstNames", &target_data.first_name);
        set_first_entry(&mut edits, record, "lastNames", &target_data.last_name);
        set_first_entry(&mut edits, record, "icons", &target_data.icon);
    }

    Ok(edits.apply())
}

fn set_first_entry(edits: &mut TextEdits<'_>, record: &Element, container: &str, value: &str) {
    if let Some(entry) = record.child(container).and_then(Element::first_child) {
        edits.set_text(entry, value);
    }
}
