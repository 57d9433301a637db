//! Turning a requested set of crew swaps into a downloadable `.wotmod`.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::archive::{build_zip, nation_entry_path};
use crate::error::IResult;
use crate::substitute::substitute;
use crate::tankmen::Roster;

/// File name offered for the generated archive.
pub const MODPACK_FILE_NAME: &str = "crew_remap.wotmod";

/// Group valid `source -> target` swaps by the nations they affect.
///
/// Entries with a blank target, or whose source or target is not a known
/// tankman, are dropped. A swap applies to every nation the source appears in.
pub fn plan<S, T>(
    roster: &Roster,
    form: impl IntoIterator<Item = (S, T)>,
) -> BTreeMap<String, BTreeMap<String, String>>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut by_nation: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (source_slug, target_slug) in form {
        let (source_slug, target_slug) = (source_slug.as_ref().trim(), target_slug.as_ref().trim());
        if target_slug.is_empty() {
            continue;
        }

        let Some(source) = roster.tankman(source_slug) else {
            debug!(source = source_slug, "dropping swap with unknown source");
            continue;
        };
        if !roster.contains(target_slug) {
            debug!(source = source_slug, target = target_slug, "dropping swap with unknown target");
            continue;
        }

        for nation in source.nation_data.keys() {
            by_nation
                .entry(nation.clone())
                .or_default()
                .insert(source_slug.to_string(), target_slug.to_string());
        }
    }
    by_nation
}

/// Rewritten XML for every affected nation, keyed by nation.
pub fn build_files<S, T>(
    roster: &Roster,
    form: impl IntoIterator<Item = (S, T)>,
) -> IResult<BTreeMap<String, String>>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    plan(roster, form)
        .into_iter()
        .map(|(nation, mapping)| {
            let xml = substitute(roster, &nation, &mapping)?;
            Ok((nation, xml))
        })
        .collect()
}

/// Build the `.wotmod` archive for the requested swaps.
pub fn build_modpack<S, T>(roster: &Roster, form: impl IntoIterator<Item = (S, T)>) -> IResult<Vec<u8>>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let files = build_files(roster, form)?;
    info!(nations = files.len(), "building modpack");
    build_zip(
        files
            .into_iter()
            .map(|(nation, xml)| (nation_entry_path(&nation), xml)),
    )
}
