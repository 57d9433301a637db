use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bon::Builder;
use rootcause::prelude::*;

use crate::catalog::CatalogCache;
use crate::tankmen::Roster;
use crate::voices::load_voice_tags;

/// Locations of the game data the tool is built from.
#[derive(Builder, Debug, Clone)]
pub struct DataPaths {
    /// Directory of gettext `.mo` catalogs; each file stem is a catalog name.
    #[builder(into)]
    pub catalogs_dir: PathBuf,
    /// XML file listing the special voice-over tags.
    #[builder(into)]
    pub voices_file: PathBuf,
    /// Directory of per-nation crew files; each file stem is a nation code.
    #[builder(into)]
    pub tankmen_dir: PathBuf,
}

impl DataPaths {
    /// The default layout: `mo/`, `special_voices.xml` and `tankmen/` under `base`.
    pub fn from_base_dir(base: &Path) -> Self {
        Self {
            catalogs_dir: base.join("mo"),
            voices_file: base.join("special_voices.xml"),
            tankmen_dir: base.join("tankmen"),
        }
    }
}

/// Everything loaded at startup and shared with every request afterwards.
pub struct LoadedData {
    pub catalogs: CatalogCache,
    pub voice_tags: BTreeSet<String>,
    pub roster: Roster,
}

/// Load voice tags, catalogs and the crew roster. Any failure here is fatal.
pub fn load_all(paths: &DataPaths) -> Result<LoadedData, Report> {
    let voice_tags = load_voice_tags(&paths.voices_file)
        .context_with(|| format!("Failed to load voice tags from {}", paths.voices_file.display()))?;
    let catalogs = CatalogCache::load(&paths.catalogs_dir)
        .context_with(|| format!("Failed to load catalogs from {}", paths.catalogs_dir.display()))?;
    let roster = Roster::load(&paths.tankmen_dir, &catalogs, &voice_tags)
        .context_with(|| format!("Failed to load tankmen from {}", paths.tankmen_dir.display()))?;

    Ok(LoadedData {
        catalogs,
        voice_tags,
        roster,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::encode_mo;
    use crate::tankmen::test::USA;

    #[test]
    fn test_default_layout() {
        let paths = DataPaths::from_base_dir(Path::new("data"));
        assert_eq!(paths.catalogs_dir, Path::new("data/mo"));
        assert_eq!(paths.voices_file, Path::new("data/special_voices.xml"));
        assert_eq!(paths.tankmen_dir, Path::new("data/tankmen"));

        let built = DataPaths::builder()
            .catalogs_dir("data/mo")
            .voices_file("data/special_voices.xml")
            .tankmen_dir("data/tankmen")
            .build();
        assert_eq!(built.tankmen_dir, paths.tankmen_dir);
    }

    #[test]
    fn test_load_all_from_disk() {
        let base = tempfile::tempdir().unwrap();
        let paths = DataPaths::from_base_dir(base.path());
        std::fs::create_dir_all(&paths.catalogs_dir).unwrap();
        std::fs::create_dir_all(&paths.tankmen_dir).unwrap();
        std::fs::write(
            &paths.voices_file,
            "<special_voices.xml><voiceover><a><tag>v1</tag></a><b><tag>v2</tag></b></voiceover></special_voices.xml>",
        )
        .unwrap();
        std::fs::write(
            paths.catalogs_dir.join("usa_tankmen.mo"),
            encode_mo(&[("alpha_first", "Pavel")]),
        )
        .unwrap();
        std::fs::write(paths.tankmen_dir.join("usa.xml"), USA).unwrap();

        let loaded = load_all(&paths).unwrap();

        assert_eq!(loaded.voice_tags.len(), 2);
        assert_eq!(loaded.catalogs.len(), 1);
        assert_eq!(loaded.roster.document("usa"), Some(USA));
        assert_eq!(loaded.roster.tankman("alpha").unwrap().first_name, "Pavel");
        assert_eq!(loaded.roster.len(), 2);
    }

    #[test]
    fn test_missing_data_is_fatal() {
        let paths = DataPaths::from_base_dir(Path::new("/nonexistent/crewremap"));
        assert!(load_all(&paths).is_err());
    }
}
