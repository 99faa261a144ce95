//! Directory-backed references database.
//!
//! Every `*.json` file in the directory holds one record. `template.json` is
//! a blank record kept for authors to copy and is skipped.

use std::fs;
use std::path::Path;

use quire::{Error, ReferenceMap, Result};
use serde::Deserialize;

const TEMPLATE_FILE: &str = "template.json";

/// One reference record. Fields other than `name` and `title` (authors,
/// year, publisher...) are accepted and ignored by the formatter.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceRecord {
    /// Citation key
    pub name: String,
    pub title: String,
}

impl ReferenceRecord {
    /// Formatted bibliographic text.
    pub fn format(&self) -> String {
        format!("{}. {}.", self.name, self.title)
    }
}

/// Load every record in `dir` into an in-memory map.
///
/// Names are unique ignoring case; a second record with the same name fails
/// with [`Error::InvalidConfig`].
pub fn load_dir(dir: &Path) -> Result<ReferenceMap> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().and_then(|e| e.to_str()) == Some("json")
                && path.file_name().and_then(|n| n.to_str()) != Some(TEMPLATE_FILE)
        })
        .collect();
    paths.sort();

    let mut map = ReferenceMap::new();
    for path in paths {
        let json = fs::read_to_string(&path)?;
        let record: ReferenceRecord = serde_json::from_str(&json)?;
        if map.contains(&record.name) {
            return Err(Error::InvalidConfig(format!(
                "duplicate reference name {:?} in {}",
                record.name,
                path.display()
            )));
        }
        log::debug!("loaded reference {:?} from {}", record.name, path.display());
        map.insert(&record.name, record.format());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire::ReferenceSource;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, json: &str) {
        fs::write(dir.join(name), json).unwrap();
    }

    #[test]
    fn test_load_dir_formats_records() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "darwin.json",
            r#"{"name": "Darwin 1859", "title": "On the Origin of Species", "year": 1859}"#,
        );
        write(dir.path(), "template.json", r#"{"name": "", "title": ""}"#);
        write(dir.path(), "notes.txt", "ignored");

        let map = load_dir(dir.path()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.resolve("darwin 1859").unwrap(),
            "Darwin 1859. On the Origin of Species."
        );
    }

    #[test]
    fn test_extra_record_fields_ignored() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "knuth.json",
            r#"{"name": "Knuth", "title": "TAOCP", "authors": ["Donald Knuth"],
                "year": "1968", "publisher": {"name": "Addison-Wesley"}}"#,
        );

        let map = load_dir(dir.path()).unwrap();
        assert_eq!(map.resolve("knuth").unwrap(), "Knuth. TAOCP.");
    }

    #[test]
    fn test_load_dir_rejects_duplicates() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"name": "Knuth", "title": "TAOCP"}"#);
        write(dir.path(), "b.json", r#"{"name": "KNUTH", "title": "TeXbook"}"#);

        let err = load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("KNUTH")));
    }
}
