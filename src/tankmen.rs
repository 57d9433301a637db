//! Premium crew members loaded from `res/scripts/item_defs/tankmen/<nation>.xml`.
//!
//! Each nation file lists its special crew members under `<premiumGroups>`,
//! keyed by a slug element name shared across nations. Only crew members
//! carrying one of the special voice-over tags are kept.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::read_dir;
use std::path::Path;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogCache, parse_reference};
use crate::error::IResult;
use crate::xml::{self, Element};

pub const PREMIUM_GROUPS: &str = "premiumGroups";

/// Raw, unresolved values of a crew member as written in one nation's file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubstitutionData {
    pub first_name: String,
    pub last_name: String,
    pub icon: String,
    pub tags: String,
}

impl SubstitutionData {
    fn from_record(record: &Element) -> Self {
        Self {
            first_name: first_entry_text(record, "firstNames"),
            last_name: first_entry_text(record, "lastNames"),
            icon: first_entry_text(record, "icons"),
            tags: record.child_text("tags").unwrap_or_default().to_string(),
        }
    }
}

/// A crew member identity shared across nations.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tankman {
    pub first_name: String,
    pub last_name: String,
    pub icon: String,
    pub slug: String,
    pub voice_tag: String,
    pub nation_data: BTreeMap<String, SubstitutionData>,
}

impl Tankman {
    /// Name used to order the crew list.
    pub fn display_name(&self) -> String {
        format!("{}{}", self.first_name, self.last_name)
    }
}

/// Text of the first entry inside a container such as `<firstNames>`.
pub(crate) fn first_entry_text(record: &Element, container: &str) -> String {
    record
        .child(container)
        .and_then(Element::first_child)
        .and_then(Element::text)
        .unwrap_or_default()
        .to_string()
}

/// Slugs with this marker are event-only duplicates and cannot be remapped.
const RACE_MARKER: &str = "race";

/// The crew directory together with the untouched nation documents it was built from.
#[derive(Debug, Default)]
pub struct Roster {
    documents: BTreeMap<String, String>,
    tankmen: HashMap<String, Tankman>,
}

impl Roster {
    /// Load every nation file in `dir`. Files are visited in name order, so the
    /// first nation alphabetically provides a crew member's display name.
    pub fn load(dir: &Path, catalogs: &CatalogCache, voice_tags: &BTreeSet<String>) -> IResult<Self> {
        let mut paths = Vec::new();
        for entry in read_dir(dir)? {
            let entry = entry?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(nation) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(path = %path.display(), "skipping nation file with non UTF-8 name");
                continue;
            };
            let data = std::fs::read(&path)?;
            documents.push((nation.to_string(), String::from_utf8_lossy(&data).into_owned()));
        }

        let roster = Self::from_documents(documents, catalogs, voice_tags);
        info!(
            nations = roster.documents.len(),
            tankmen = roster.tankmen.len(),
            dir = %dir.display(),
            "loaded tankmen"
        );
        Ok(roster)
    }

    /// Build the roster from `(nation, xml)` pairs, processed in the given order.
    pub fn from_documents(
        documents: impl IntoIterator<Item = (String, String)>,
        catalogs: &CatalogCache,
        voice_tags: &BTreeSet<String>,
    ) -> Self {
        let mut roster = Self::default();
        for (nation, text) in documents {
            roster.add_nation(&nation, &text, catalogs, voice_tags);
            roster.documents.insert(nation, text);
        }
        roster
    }

    fn add_nation(
        &mut self,
        nation: &str,
        text: &str,
        catalogs: &CatalogCache,
        voice_tags: &BTreeSet<String>,
    ) {
        let doc = xml::parse(text);
        let Some(groups) = doc.root().child(PREMIUM_GROUPS) else {
            warn!(nation, "no premiumGroups in nation file");
            return;
        };

        for record in groups.children() {
            let slug = record.name();
            if slug.contains(RACE_MARKER) {
                debug!(nation, slug, "skipping race crew member");
                continue;
            }

            // several voice tags can match; take the smallest so the pick is stable
            let tags = record.child_text("tags").unwrap_or_default();
            let Some(voice_tag) = tags
                .split_whitespace()
                .filter(|tag| voice_tags.contains(*tag))
                .min()
            else {
                continue;
            };

            let data = SubstitutionData::from_record(record);
            let tankman = self.tankmen.entry(slug.to_string()).or_insert_with(|| {
                debug!(nation, slug, voice_tag, icon = data.icon.trim(), "new tankman");
                Tankman {
                    first_name: resolve_name(catalogs, &data.first_name),
                    last_name: resolve_name(catalogs, &data.last_name),
                    icon: resolve_icon(catalogs, &data.icon),
                    slug: slug.to_string(),
                    voice_tag: voice_tag.to_string(),
                    nation_data: BTreeMap::new(),
                }
            });
            tankman.nation_data.insert(nation.to_string(), data);
        }
    }

    pub fn tankman(&self, slug: &str) -> Option<&Tankman> {
        self.tankmen.get(slug)
    }

    pub fn tankmen(&self) -> impl Iterator<Item = &Tankman> {
        self.tankmen.values()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.tankmen.contains_key(slug)
    }

    /// The nation file exactly as it was read.
    pub fn document(&self, nation: &str) -> Option<&str> {
        self.documents.get(nation).map(String::as_str)
    }

    pub fn nations(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// All tankmen ordered by first name followed by last name.
    pub fn listing(&self) -> Vec<&Tankman> {
        self.tankmen
            .values()
            .sorted_by(|a, b| {
                a.display_name()
                    .cmp(&b.display_name())
                    .then_with(|| a.slug.cmp(&b.slug))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tankmen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tankmen.is_empty()
    }
}

fn resolve_name(catalogs: &CatalogCache, reference: &str) -> String {
    catalogs.get_name(reference.trim()).unwrap_or_default().to_string()
}

/// Icons are usually plain file names, but may also be catalog references.
fn resolve_icon(catalogs: &CatalogCache, icon: &str) -> String {
    let icon = icon.trim();
    if parse_reference(icon).is_some() {
        resolve_name(catalogs, icon)
    } else {
        icon.to_string()
    }
}
