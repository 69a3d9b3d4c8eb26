//! Font resolution with a deterministic fallback chain.
//!
//! Registry mode looks names up in a JSON catalog and falls back to its
//! `"default"` entry. Directory mode matches file stems (exact, then
//! case-insensitive) and falls back to a configured default path. A candidate
//! only counts when the file actually parses as a font.

mod catalog;
mod face;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::application::render::{FaceSource, FontError, GlyphFace};
use crate::config::{FontCatalogMode, FontSettings};
use crate::domain::request::DEFAULT_FONT_NAME;

pub use catalog::{
    FONT_EXTENSIONS, RegistryCache, RegistryEntries, ScannedFont, directory_candidates,
    read_registry, scan_directory,
};
pub use face::LoadedFont;

const SOURCE: &str = "infra::fonts";

/// Pixel size used to prove a font file is loadable.
pub const PROBE_SIZE_PX: f32 = 48.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontCatalog {
    /// Explicit `name -> relative path` mapping stored as JSON.
    Registry {
        catalog_path: PathBuf,
        base_dir: PathBuf,
    },
    /// Files in `dir` keyed by stem, with a hardcoded last-resort font.
    Directory { dir: PathBuf, default_path: PathBuf },
}

/// A catalog entry that was proven loadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    pub name: String,
    pub path: PathBuf,
    /// True when the requested name was not the one that loaded.
    pub substituted: bool,
}

#[derive(Debug)]
pub struct FontResolver {
    catalog: FontCatalog,
    cache: Option<RegistryCache>,
}

impl FontResolver {
    pub fn new(catalog: FontCatalog) -> Self {
        Self {
            catalog,
            cache: None,
        }
    }

    pub fn from_settings(settings: &FontSettings) -> Self {
        let catalog = match settings.mode {
            FontCatalogMode::Registry => FontCatalog::Registry {
                catalog_path: settings.data_dir.join(&settings.catalog_file),
                base_dir: settings.data_dir.clone(),
            },
            FontCatalogMode::Directory => FontCatalog::Directory {
                dir: settings.directory.clone(),
                default_path: settings.default_font.clone(),
            },
        };
        let resolver = Self::new(catalog);
        if settings.cache_catalog {
            resolver.with_registry_cache()
        } else {
            resolver
        }
    }

    /// Cache registry reads until the catalog file's mtime changes.
    pub fn with_registry_cache(mut self) -> Self {
        self.cache = Some(RegistryCache::new());
        self
    }

    /// Create the data directory and an empty registry when none exists yet.
    pub fn ensure_catalog(&self) -> Result<(), FontError> {
        match &self.catalog {
            FontCatalog::Registry {
                catalog_path,
                base_dir,
            } => {
                fs::create_dir_all(base_dir).map_err(|err| FontError::Catalog(err.to_string()))?;
                if !catalog_path.exists() {
                    if let Some(parent) = catalog_path.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|err| FontError::Catalog(err.to_string()))?;
                    }
                    fs::write(catalog_path, "{}")
                        .map_err(|err| FontError::Catalog(err.to_string()))?;
                }
                Ok(())
            }
            FontCatalog::Directory { dir, .. } => {
                fs::create_dir_all(dir).map_err(|err| FontError::Catalog(err.to_string()))
            }
        }
    }

    /// Resolve `name` to a loadable font file.
    pub fn resolve(&self, name: &str) -> Result<ResolvedFont, FontError> {
        let resolved = match &self.catalog {
            FontCatalog::Registry {
                catalog_path,
                base_dir,
            } => self.resolve_registry(name, catalog_path, base_dir),
            FontCatalog::Directory { dir, default_path } => {
                resolve_directory(name, dir, default_path)
            }
        };

        match resolved {
            Some(font) => {
                debug!(
                    target = SOURCE,
                    op = "resolve",
                    requested = name,
                    resolved = %font.name,
                    substituted = font.substituted,
                    path = %font.path.display(),
                    "Font resolved"
                );
                Ok(font)
            }
            None => {
                warn!(
                    target = SOURCE,
                    op = "resolve",
                    result = "unavailable",
                    requested = name,
                    "Neither the requested font nor the default font could be loaded"
                );
                Err(FontError::Unavailable {
                    requested: name.to_string(),
                })
            }
        }
    }

    /// Names available for `font:<name>`, sorted.
    pub fn list(&self) -> Vec<String> {
        match &self.catalog {
            FontCatalog::Registry { catalog_path, .. } => {
                self.registry_entries(catalog_path).into_keys().collect()
            }
            FontCatalog::Directory { dir, .. } => {
                let mut stems: Vec<String> =
                    scan_directory(dir).into_iter().map(|font| font.stem).collect();
                stems.sort();
                stems.dedup();
                stems
            }
        }
    }

    fn registry_entries(&self, catalog_path: &Path) -> RegistryEntries {
        match &self.cache {
            Some(cache) => cache.entries(catalog_path),
            None => read_registry(catalog_path),
        }
    }

    fn resolve_registry(
        &self,
        name: &str,
        catalog_path: &Path,
        base_dir: &Path,
    ) -> Option<ResolvedFont> {
        let entries = self.registry_entries(catalog_path);
        let mut candidates = vec![name];
        if name != DEFAULT_FONT_NAME {
            candidates.push(DEFAULT_FONT_NAME);
        }

        candidates.into_iter().find_map(|candidate| {
            let relative = entries.get(candidate)?;
            let path = base_dir.join(relative);
            is_loadable(&path).then(|| ResolvedFont {
                name: candidate.to_string(),
                path,
                substituted: candidate != name,
            })
        })
    }
}

fn resolve_directory(name: &str, dir: &Path, default_path: &Path) -> Option<ResolvedFont> {
    let fonts = scan_directory(dir);
    let matched = directory_candidates(&fonts, name)
        .into_iter()
        .find(|font| is_loadable(&font.path))
        .map(|font| ResolvedFont {
            name: font.stem.clone(),
            path: font.path.clone(),
            substituted: false,
        });

    matched.or_else(|| {
        is_loadable(default_path).then(|| ResolvedFont {
            name: DEFAULT_FONT_NAME.to_string(),
            path: default_path.to_path_buf(),
            substituted: true,
        })
    })
}

/// A font is loadable when it parses and yields a usable line height at the probe size.
pub fn is_loadable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match LoadedFont::open(path, PROBE_SIZE_PX) {
        Ok(font) => {
            let height = font.line_height();
            height.is_finite() && height > 0.0
        }
        Err(err) => {
            debug!(
                target = SOURCE,
                op = "is_loadable",
                result = "rejected",
                path = %path.display(),
                error = %err,
                "Font candidate failed to load"
            );
            false
        }
    }
}

impl FaceSource for FontResolver {
    fn load_face(&self, name: &str, size: u32) -> Result<Box<dyn GlyphFace + Send>, FontError> {
        let resolved = self.resolve(name)?;
        let face = LoadedFont::open(&resolved.path, size as f32)?;
        Ok(Box::new(face))
    }

    fn font_names(&self) -> Result<Vec<String>, FontError> {
        Ok(self.list())
    }
}
