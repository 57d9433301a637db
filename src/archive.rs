use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::IResult;

/// Where the game's mod loader expects crew definitions inside a `.wotmod`.
pub const TANKMEN_DIR: &str = "res/scripts/item_defs/tankmen/";

pub fn nation_entry_path(nation: &str) -> String {
    format!("{TANKMEN_DIR}{nation}.xml")
}

/// Write `(path, content)` pairs into an in-memory zip.
///
/// Entries are stored without compression; `.wotmod` packages are expected to
/// be uncompressed.
pub fn build_zip<P, C>(entries: impl IntoIterator<Item = (P, C)>) -> IResult<Vec<u8>>
where
    P: AsRef<str>,
    C: AsRef<[u8]>,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in entries {
        writer.start_file(path.as_ref(), options)?;
        writer.write_all(content.as_ref())?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn test_single_stored_entry() {
        let path = nation_entry_path("usa");
        assert_eq!(path, "res/scripts/item_defs/tankmen/usa.xml");

        let bytes = build_zip([(path.as_str(), "<xml/>")]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "res/scripts/item_defs/tankmen/usa.xml");
        assert_eq!(entry.compression(), CompressionMethod::Stored);

        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "<xml/>");
    }

    #[test]
    fn test_empty_archive() {
        let bytes = build_zip(Vec::<(String, String)>::new()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
