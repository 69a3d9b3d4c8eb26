//! Bundles a job's rasters into one deliverable file.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::workspace::WorkDir;

const SOURCE: &str = "infra::packaging";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("nothing to package")]
    Empty,
    #[error("raster path `{}` has no usable file name", .0.display())]
    InvalidName(PathBuf),
    #[error("packaging io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// What gets handed to delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deliverable {
    File { path: PathBuf, name: String },
    Archive { path: PathBuf, name: String },
}

impl Deliverable {
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path, .. } | Self::Archive { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Archive { name, .. } => name,
        }
    }
}

/// One raster is delivered as-is; several become a flat deflate zip next to the workdir.
pub fn package(workdir: &WorkDir, rasters: &[PathBuf]) -> Result<Deliverable, PackageError> {
    match rasters {
        [] => Err(PackageError::Empty),
        [single] => Ok(Deliverable::File {
            name: file_name(single)?.to_string(),
            path: single.clone(),
        }),
        many => {
            let archive = workdir.archive_path();
            write_archive(archive, many)?;
            debug!(
                target = SOURCE,
                op = "package",
                entries = many.len(),
                path = %archive.display(),
                "Archive written"
            );
            Ok(Deliverable::Archive {
                name: file_name(archive)?.to_string(),
                path: archive.to_path_buf(),
            })
        }
    }
}

fn write_archive(archive: &Path, rasters: &[PathBuf]) -> Result<(), PackageError> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for raster in rasters {
        zip.start_file(file_name(raster)?, options)?;
        let mut source = File::open(raster)?;
        io::copy(&mut source, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer)?;
    Ok(())
}

fn file_name(path: &Path) -> Result<&str, PackageError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PackageError::InvalidName(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Read;

    use tempfile::TempDir;
    use time::OffsetDateTime;

    use crate::domain::types::RequesterId;
    use crate::infra::workspace::Workspace;

    fn rasters(workdir: &WorkDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|index| {
                let path = workdir.raster_path(index);
                fs::write(&path, format!("raster-{index}").repeat(50)).expect("write raster");
                path
            })
            .collect()
    }

    #[test]
    fn single_raster_is_delivered_directly() {
        let root = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(root.path());
        let workdir = workspace
            .create(&RequesterId::new("u"), OffsetDateTime::now_utc())
            .expect("workdir");
        let files = rasters(&workdir, 1);

        let deliverable = package(&workdir, &files).expect("package");
        assert_eq!(deliverable.path(), files[0].as_path());
        assert!(matches!(deliverable, Deliverable::File { .. }));
        assert!(!workdir.archive_path().exists());
    }

    #[test]
    fn archive_unpacks_to_identical_flat_files() {
        let root = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(root.path());
        let workdir = workspace
            .create(&RequesterId::new("u"), OffsetDateTime::now_utc())
            .expect("workdir");
        let files = rasters(&workdir, 3);

        let deliverable = package(&workdir, &files).expect("package");
        let Deliverable::Archive { path, name } = deliverable else {
            panic!("expected an archive");
        };
        assert_eq!(name, format!("{}.zip", workdir.name()));

        let mut archive = zip::ZipArchive::new(File::open(&path).expect("open")).expect("zip");
        assert_eq!(archive.len(), 3);
        for (index, original) in files.iter().enumerate() {
            let mut entry = archive.by_index(index).expect("entry");
            assert_eq!(
                entry.name(),
                original.file_name().and_then(|n| n.to_str()).expect("name")
            );
            assert_eq!(entry.compression(), CompressionMethod::Deflated);
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).expect("read entry");
            assert_eq!(bytes, fs::read(original).expect("read original"));
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let root = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(root.path());
        let workdir = workspace
            .create(&RequesterId::new("u"), OffsetDateTime::now_utc())
            .expect("workdir");
        assert!(matches!(package(&workdir, &[]), Err(PackageError::Empty)));
    }
}
