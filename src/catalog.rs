//! Translation catalogs from the game's `res/text/LC_MESSAGES/*.mo` files.
//!
//! Crew names in the nation XML files are stored as references of the form
//! `#<catalog>:<key>`, e.g. `#usa_tankmen:Rodriguez_firstname`. The catalog
//! name is the `.mo` file's stem.

use std::collections::HashMap;
use std::fs::{File, read_dir};
use std::path::Path;
use std::sync::LazyLock;

use gettext::Catalog;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{ErrorKind, IResult};

/// Placeholder the game uses for translations that are intentionally blank.
pub const EMPTY_PLACEHOLDER: &str = "?empty?";

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?P<catalog>[a-zA-Z0-9_-]+):(?P<key>.+)$").expect("valid catalog reference regex")
});

/// Split a `#catalog:key` reference into its parts.
pub fn parse_reference(reference: &str) -> Option<(&str, &str)> {
    let captures = REFERENCE_PATTERN.captures(reference)?;
    Some((
        captures.name("catalog")?.as_str(),
        captures.name("key")?.as_str(),
    ))
}

/// All loaded catalogs, keyed by catalog name.
#[derive(Default)]
pub struct CatalogCache {
    catalogs: HashMap<String, Catalog>,
}

impl CatalogCache {
    /// Load every file in `dir` as a gettext catalog.
    pub fn load(dir: &Path) -> IResult<Self> {
        let mut catalogs = HashMap::new();
        for entry in read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                debug!(path = %path.display(), "skipping catalog with non UTF-8 name");
                continue;
            };

            let catalog = Catalog::parse(File::open(&path)?).map_err(|err| ErrorKind::CatalogError {
                path: path.clone(),
                err,
            })?;
            catalogs.insert(name.to_string(), catalog);
        }

        info!(count = catalogs.len(), dir = %dir.display(), "loaded translation catalogs");
        Ok(Self { catalogs })
    }

    pub fn from_catalogs(catalogs: impl IntoIterator<Item = (String, Catalog)>) -> Self {
        Self {
            catalogs: catalogs.into_iter().collect(),
        }
    }

    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.get(name)
    }

    /// Resolve a `#catalog:key` reference.
    ///
    /// Returns `None` for anything that is not a reference, for unknown catalogs,
    /// and for keys the catalog does not contain. [`EMPTY_PLACEHOLDER`] resolves
    /// to an empty string.
    pub fn get_name<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        let (catalog, key) = parse_reference(reference)?;
        let translated = self.catalog(catalog)?.gettext(key);
        // gettext hands our own msgid slice back when it has no translation, so a
        // stored value that happens to equal the key is still a hit
        if std::ptr::eq(translated, key) {
            return None;
        }

        if translated == EMPTY_PLACEHOLDER {
            Some("")
        } else {
            Some(translated)
        }
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

/// Encode a minimal little-endian `.mo` file.
#[cfg(test)]
pub(crate) fn encode_mo(entries: &[(&str, &str)]) -> Vec<u8> {
    let count = entries.len() as u32;
    let originals_offset = 28u32;
    let translations_offset = originals_offset + count * 8;
    let mut data_offset = translations_offset + count * 8;

    let mut header = Vec::new();
    for value in [0x950412de, 0, count, originals_offset, translations_offset, 0, data_offset] {
        header.extend_from_slice(&u32::to_le_bytes(value));
    }

    let mut originals = Vec::new();
    let mut translations = Vec::new();
    let mut data = Vec::new();
    for table in [0, 1] {
        for entry in entries {
            let text = if table == 0 { entry.0 } else { entry.1 };
            let target = if table == 0 { &mut originals } else { &mut translations };
            target.extend_from_slice(&(text.len() as u32).to_le_bytes());
            target.extend_from_slice(&data_offset.to_le_bytes());
            data.extend_from_slice(text.as_bytes());
            data.push(0);
            data_offset += text.len() as u32 + 1;
        }
    }

    [header, originals, translations, data].concat()
}

#[cfg(test)]
pub(crate) fn test_cache(catalogs: &[(&str, &[(&str, &str)])]) -> CatalogCache {
    CatalogCache::from_catalogs(catalogs.iter().map(|(name, entries)| {
        let catalog = Catalog::parse(encode_mo(entries).as_slice()).unwrap();
        (name.to_string(), catalog)
    }))
}
