//! Template archive extraction
//!
//! A template archive is a ZIP file containing:
//! - layout.xml: the layout document (required by the importer, not here)
//! - page.master: master layout file (optional)
//! - css/: stylesheets (optional)
//! - images/: theme images (optional)

use crate::{ExtractionError, ExtractionResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::read::ZipArchive;

/// What an extraction wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Files written, relative to the destination
    pub files: Vec<PathBuf>,
    /// Directories created from directory entries
    pub directories: usize,
}

/// Extract every entry of `archive` into `dest`.
///
/// `dest` and its missing ancestors are created first. Existing files are
/// overwritten. On error the destination may be partially populated; removing
/// it is the caller's job.
pub fn extract_archive(archive: &Path, dest: &Path) -> ExtractionResult<ExtractionSummary> {
    if !archive.is_file() {
        return Err(ExtractionError::ArchiveNotFound(archive.to_path_buf()));
    }

    fs::create_dir_all(dest)?;

    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    let mut summary = ExtractionSummary::default();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.enclosed_name().is_none() {
            return Err(ExtractionError::UnsafeEntry(entry.name().to_string()));
        }
        let (relative, is_dir) = entry_path(entry.name())?;

        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if is_dir || entry.is_dir() {
            fs::create_dir_all(&target)?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        debug!(entry = %relative.display(), "extracted");
        summary.files.push(relative);
    }

    Ok(summary)
}

/// Turn an entry name into a path relative to the destination.
///
/// `enclosed_name` only splits on the host separator, so names written with
/// `\` are split here and checked again. Absolute names, drive prefixes and
/// `..` components are rejected. Returns the path and whether the entry names
/// a directory.
fn entry_path(name: &str) -> ExtractionResult<(PathBuf, bool)> {
    let normalized = name.replace('\\', "/");
    let unsafe_entry = || ExtractionError::UnsafeEntry(name.to_string());

    if normalized.starts_with('/') {
        return Err(unsafe_entry());
    }

    let mut path = PathBuf::new();
    for (index, component) in normalized.split('/').enumerate() {
        match component {
            "" | "." => continue,
            ".." => return Err(unsafe_entry()),
            c if index == 0 && c.contains(':') => return Err(unsafe_entry()),
            c => path.push(c),
        }
    }

    Ok((path, normalized.ends_with('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_entry_path() {
        assert_eq!(
            entry_path("css/site.css").unwrap(),
            (PathBuf::from("css").join("site.css"), false)
        );
        assert_eq!(
            entry_path("images\\logo.png").unwrap(),
            (PathBuf::from("images").join("logo.png"), false)
        );
        assert_eq!(entry_path("images/").unwrap(), (PathBuf::from("images"), true));
        assert_eq!(entry_path("./layout.xml").unwrap().0, PathBuf::from("layout.xml"));

        for bad in ["../evil.txt", "css/../../evil", "/etc/passwd", "\\evil", "C:/evil", "c:evil"] {
            assert!(
                matches!(entry_path(bad), Err(ExtractionError::UnsafeEntry(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_extract_creates_destination_and_overwrites() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("template.zip");
        write_zip(
            &archive,
            &[
                ("layout.xml", b"<Template/>"),
                ("css/", b""),
                ("css/site.css", b"body {}"),
                ("images/logo.png", b"png"),
            ],
        );

        let dest = dir.path().join("a").join("b");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("layout.xml"), "stale").unwrap();

        let summary = extract_archive(&archive, &dest).unwrap();
        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.directories, 1);
        assert_eq!(fs::read_to_string(dest.join("layout.xml")).unwrap(), "<Template/>");
        assert_eq!(fs::read(dest.join("images").join("logo.png")).unwrap(), b"png");
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempdir().unwrap();
        let result = extract_archive(&dir.path().join("nope.zip"), &dir.path().join("out"));
        assert!(matches!(result, Err(ExtractionError::ArchiveNotFound(_))));
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip file").unwrap();

        let result = extract_archive(&archive, &dir.path().join("out"));
        assert!(matches!(result, Err(ExtractionError::Zip(_))));
    }

    #[test]
    fn test_unsafe_entry_is_not_written() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escaped.txt", b"gotcha")]);

        let dest = dir.path().join("out");
        let result = extract_archive(&archive, &dest);
        assert!(matches!(result, Err(ExtractionError::UnsafeEntry(_))));
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_backslash_traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("css\\..\\..\\escaped.txt", b"gotcha")]);

        let dest = dir.path().join("out");
        let result = extract_archive(&archive, &dest);
        assert!(matches!(result, Err(ExtractionError::UnsafeEntry(_))));
        assert!(!dir.path().join("escaped.txt").exists());
    }
}
