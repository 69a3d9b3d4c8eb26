//! Font catalog sources: a persisted JSON registry or a scanned directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::infra::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::fonts::catalog";

/// Extensions picked up by a directory scan.
pub const FONT_EXTENSIONS: [&str; 5] = ["ttf", "otf", "ttc", "woff", "woff2"];

/// `name -> relative path` entries from the registry file.
pub type RegistryEntries = BTreeMap<String, String>;

/// Read the registry file. A missing or malformed file reads as an empty catalog.
pub fn read_registry(path: &Path) -> RegistryEntries {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "read_registry",
                result = "unreadable",
                path = %path.display(),
                error = %err,
                "Font catalog could not be read; treating it as empty"
            );
            return RegistryEntries::new();
        }
    };

    match serde_json::from_str::<RegistryEntries>(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "read_registry",
                result = "malformed",
                path = %path.display(),
                error = %err,
                "Font catalog is not a JSON object of strings; treating it as empty"
            );
            RegistryEntries::new()
        }
    }
}

/// Read-through cache of the registry, invalidated by the file's modification time.
#[derive(Debug, Default)]
pub struct RegistryCache {
    state: RwLock<Option<CachedRegistry>>,
}

#[derive(Debug, Clone)]
struct CachedRegistry {
    modified: SystemTime,
    entries: RegistryEntries,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, path: &Path) -> RegistryEntries {
        let Some(modified) = fs::metadata(path).and_then(|meta| meta.modified()).ok() else {
            return read_registry(path);
        };

        {
            let guard = rw_read(&self.state, SOURCE, "entries");
            if let Some(cached) = guard.as_ref() {
                if cached.modified == modified {
                    return cached.entries.clone();
                }
            }
        }

        let entries = read_registry(path);
        debug!(
            target = SOURCE,
            op = "entries",
            result = "cache_refresh",
            entries = entries.len(),
            "Font catalog reloaded"
        );
        *rw_write(&self.state, SOURCE, "entries") = Some(CachedRegistry {
            modified,
            entries: entries.clone(),
        });
        entries
    }
}

/// One font file found by a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFont {
    pub stem: String,
    pub path: PathBuf,
}

/// List font files directly inside `dir`, sorted by path.
pub fn scan_directory(dir: &Path) -> Vec<ScannedFont> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "scan_directory",
                result = "unreadable",
                path = %dir.display(),
                error = %err,
                "Font directory could not be scanned"
            );
            return Vec::new();
        }
    };

    let mut fonts: Vec<ScannedFont> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_font_extension(path))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some(ScannedFont { stem, path })
        })
        .collect();
    fonts.sort_by(|a, b| a.path.cmp(&b.path));
    fonts
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Candidates for `name`: exact stem matches first, then case-insensitive ones.
pub fn directory_candidates<'a>(fonts: &'a [ScannedFont], name: &str) -> Vec<&'a ScannedFont> {
    let lowered = name.to_lowercase();
    let exact = fonts.iter().filter(|font| font.stem == name);
    let folded = fonts
        .iter()
        .filter(|font| font.stem != name && font.stem.to_lowercase() == lowered);
    exact.chain(folded).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_or_malformed_registry_is_empty() {
        let dir = TempDir::new().expect("temp dir");
        assert!(read_registry(&dir.path().join("fonts.json")).is_empty());

        let path = dir.path().join("broken.json");
        fs::write(&path, "[1, 2]").expect("write");
        assert!(read_registry(&path).is_empty());
    }

    #[test]
    fn registry_cache_refreshes_after_modification() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fonts.json");
        fs::write(&path, r#"{"default": "a.ttf"}"#).expect("write");

        let cache = RegistryCache::new();
        assert_eq!(cache.entries(&path).len(), 1);

        fs::write(&path, r#"{"default": "a.ttf", "serif": "b.ttf"}"#).expect("write");
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(later))
            .expect("touch");

        assert_eq!(cache.entries(&path).len(), 2);
    }

    #[test]
    fn scan_keeps_font_extensions_only() {
        let dir = TempDir::new().expect("temp dir");
        for name in ["Serif.TTF", "mono.otf", "notes.txt", "icons.woff2"] {
            fs::write(dir.path().join(name), b"x").expect("write");
        }
        let stems: Vec<_> = scan_directory(dir.path())
            .into_iter()
            .map(|font| font.stem)
            .collect();
        assert_eq!(stems, ["Serif", "icons", "mono"]);
    }

    #[test]
    fn exact_matches_precede_case_insensitive_ones() {
        let fonts = vec![
            ScannedFont {
                stem: "SERIF".to_string(),
                path: PathBuf::from("/f/SERIF.otf"),
            },
            ScannedFont {
                stem: "serif".to_string(),
                path: PathBuf::from("/f/serif.ttf"),
            },
        ];
        let candidates = directory_candidates(&fonts, "serif");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].stem, "serif");
        assert_eq!(candidates[1].stem, "SERIF");
        assert!(directory_candidates(&fonts, "mono").is_empty());
    }
}
