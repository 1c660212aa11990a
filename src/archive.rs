//! Archive extraction for the downloaded dataset.
//!
//! Handles the two container formats labelled datasets ship in: gzipped
//! tarballs and zip files. Entries that would escape the output directory
//! are rejected.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;
use zip::ZipArchive;

/// Errors that can occur during archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive entry escapes output directory: {0}")]
    UnsafeEntry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Container format, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(ArchiveError::UnsupportedFormat(name))
        }
    }
}

/// List the first `count` entry names without extracting.
pub fn inspect_entries(archive_path: &Path, count: usize) -> Result<Vec<String>, ArchiveError> {
    if !archive_path.exists() {
        return Err(ArchiveError::NotFound(archive_path.to_path_buf()));
    }

    let mut names = Vec::with_capacity(count);
    match ArchiveFormat::from_path(archive_path)? {
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(File::open(archive_path)?));
            for entry in tar.entries()? {
                if names.len() >= count {
                    break;
                }
                let entry = entry?;
                names.push(entry.path()?.to_string_lossy().into_owned());
            }
        }
        ArchiveFormat::Zip => {
            let mut archive = ZipArchive::new(File::open(archive_path)?)?;
            for i in 0..archive.len().min(count) {
                names.push(archive.by_index(i)?.name().to_string());
            }
        }
    }
    Ok(names)
}

/// Extract the full archive into `out_dir`, creating it if necessary.
///
/// Returns the number of regular files written. Directories, `__MACOSX`
/// metadata, and hidden files are not counted.
pub fn extract(archive_path: &Path, out_dir: &Path) -> Result<usize, ArchiveError> {
    if !archive_path.exists() {
        return Err(ArchiveError::NotFound(archive_path.to_path_buf()));
    }
    std::fs::create_dir_all(out_dir)?;

    match ArchiveFormat::from_path(archive_path)? {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, out_dir),
        ArchiveFormat::Zip => extract_zip(archive_path, out_dir),
    }
}

fn extract_tar_gz(archive_path: &Path, out_dir: &Path) -> Result<usize, ArchiveError> {
    let mut tar = tar::Archive::new(GzDecoder::new(File::open(archive_path)?));
    let mut extracted = 0;

    for entry in tar.entries()? {
        let mut entry = entry?;
        let is_file = entry.header().entry_type().is_file();
        // unpack_in refuses paths that leave out_dir instead of writing them
        if !entry.unpack_in(out_dir)? {
            return Err(ArchiveError::UnsafeEntry(
                entry.path()?.to_string_lossy().into_owned(),
            ));
        }
        if is_file {
            extracted += 1;
        }
    }
    Ok(extracted)
}

fn extract_zip(archive_path: &Path, out_dir: &Path) -> Result<usize, ArchiveError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let raw_name = file.name().to_string();

        // Skip __MACOSX resource forks
        if raw_name.starts_with("__MACOSX") {
            continue;
        }

        let Some(relative) = file.enclosed_name() else {
            return Err(ArchiveError::UnsafeEntry(raw_name));
        };
        let dest = out_dir.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        io::copy(&mut file, &mut out)?;
        extracted += 1;
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("a/b.tar.gz")).unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("b.TGZ")).unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("c.zip")).unwrap(),
            ArchiveFormat::Zip
        );
        assert!(matches!(
            ArchiveFormat::from_path(Path::new("d.rar")),
            Err(ArchiveError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_archive_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.tar.gz");
        assert!(matches!(
            extract(&missing, dir.path()),
            Err(ArchiveError::NotFound(_))
        ));
        assert!(matches!(
            inspect_entries(&missing, 5),
            Err(ArchiveError::NotFound(_))
        ));
    }

    #[test]
    fn test_tar_gz_round_trip() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("sample.tar.gz");
        write_tar_gz(
            &archive_path,
            &[
                ("imgs/0001.png", b"one".as_slice()),
                ("imgs/0002.png", b"two".as_slice()),
            ],
        );

        let names = inspect_entries(&archive_path, 5).unwrap();
        assert_eq!(names, vec!["imgs/0001.png", "imgs/0002.png"]);

        let out = dir.path().join("out");
        let count = extract(&archive_path, &out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(std::fs::read(out.join("imgs/0001.png")).unwrap(), b"one");
        assert_eq!(std::fs::read(out.join("imgs/0002.png")).unwrap(), b"two");
    }

    #[test]
    fn test_zip_round_trip_skips_macosx() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("sample.zip");
        write_zip(
            &archive_path,
            &[
                ("imgs/0001.png", b"one".as_slice()),
                ("__MACOSX/imgs/._0001.png", b"junk".as_slice()),
            ],
        );

        let out = dir.path().join("out");
        let count = extract(&archive_path, &out).unwrap();
        assert_eq!(count, 1);
        assert!(out.join("imgs/0001.png").exists());
        assert!(!out.join("__MACOSX").exists());
    }

    #[test]
    fn test_inspect_caps_entry_count() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("sample.tar.gz");
        write_tar_gz(
            &archive_path,
            &[
                ("a.png", b"a".as_slice()),
                ("b.png", b"b".as_slice()),
                ("c.png", b"c".as_slice()),
            ],
        );
        assert_eq!(inspect_entries(&archive_path, 2).unwrap().len(), 2);
    }
}
