//! Staging of template assets into the installation folder
//!
//! Installation layout for a template named `<name>`:
//! - `<root>/<name>/App_Master/page.master`
//! - `<root>/<name>/App_Themes/<name>/Global/`: stylesheets
//! - `<root>/<name>/App_Themes/<name>/Images/`: theme images

use crate::{StagingError, StagingResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Master layout file name, in the archive and in `App_Master`
pub const MASTER_FILE: &str = "page.master";
/// Stylesheet directory inside the archive
pub const CSS_DIR: &str = "css";
/// Image directory inside the archive
pub const IMAGES_DIR: &str = "images";

const MASTER_FOLDER: &str = "App_Master";
const THEMES_FOLDER: &str = "App_Themes";
const GLOBAL_FOLDER: &str = "Global";
const THEME_IMAGES_FOLDER: &str = "Images";

/// Destination folders of one installed template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFolders {
    /// `<root>/<name>`
    pub root: PathBuf,
    /// `<root>/<name>/App_Master`
    pub master: PathBuf,
    /// `<root>/<name>/App_Themes/<name>`
    pub theme: PathBuf,
    /// Stylesheet folder of the theme
    pub global: PathBuf,
    /// Image folder of the theme
    pub images: PathBuf,
}

impl TemplateFolders {
    pub fn new(installation_root: &Path, name: &str) -> Self {
        let root = installation_root.join(name);
        let theme = root.join(THEMES_FOLDER).join(name);
        Self {
            master: root.join(MASTER_FOLDER),
            global: theme.join(GLOBAL_FOLDER),
            images: theme.join(THEME_IMAGES_FOLDER),
            theme,
            root,
        }
    }

    /// Create every folder, keeping existing ones
    pub fn create(&self) -> StagingResult<()> {
        for dir in [&self.root, &self.master, &self.global, &self.images] {
            fs::create_dir_all(dir).map_err(StagingError::io(dir))?;
        }
        Ok(())
    }

    pub fn master_page(&self) -> PathBuf {
        self.master.join(MASTER_FILE)
    }
}

/// Result of staging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedAssets {
    pub folders: TemplateFolders,
    pub master_copied: bool,
    /// Copied images, at their destination
    pub images: Vec<PathBuf>,
    /// Copied stylesheets, at their destination
    pub stylesheets: Vec<PathBuf>,
    /// The archive shipped a `css/` directory, so the theme must be registered
    pub theme_registration_required: bool,
}

impl StagedAssets {
    pub fn copied_files(&self) -> usize {
        self.images.len() + self.stylesheets.len() + usize::from(self.master_copied)
    }
}

/// Create the folders for `name` under `installation_root` and copy the
/// assets found in `work_dir` into them
pub fn stage_assets(
    work_dir: &Path,
    installation_root: &Path,
    name: &str,
) -> StagingResult<StagedAssets> {
    let folders = TemplateFolders::new(installation_root, name);
    folders.create()?;
    copy_assets(work_dir, folders)
}

/// Copy assets from `work_dir` into folders that already exist
pub fn copy_assets(work_dir: &Path, folders: TemplateFolders) -> StagingResult<StagedAssets> {
    let master_source = work_dir.join(MASTER_FILE);
    let master_copied = if master_source.is_file() {
        copy_file(&master_source, &folders.master_page())?;
        true
    } else {
        false
    };

    let image_source = work_dir.join(IMAGES_DIR);
    let images = if image_source.is_dir() {
        copy_files(&image_source, &folders.images)?
    } else {
        Vec::new()
    };

    let css_source = work_dir.join(CSS_DIR);
    let theme_registration_required = css_source.is_dir();
    let stylesheets = if theme_registration_required {
        copy_files(&css_source, &folders.global)?
    } else {
        Vec::new()
    };

    Ok(StagedAssets {
        folders,
        master_copied,
        images,
        stylesheets,
        theme_registration_required,
    })
}

/// Copy the regular files directly inside `source` into `target`, overwriting
fn copy_files(source: &Path, target: &Path) -> StagingResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(source).map_err(StagingError::io(source))? {
        let entry = entry.map_err(StagingError::io(source))?;
        let path = entry.path();
        if path.is_file() {
            entries.push(path);
        }
    }
    entries.sort();

    let mut copied = Vec::with_capacity(entries.len());
    for path in entries {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let dest = target.join(file_name);
        copy_file(&path, &dest)?;
        copied.push(dest);
    }
    Ok(copied)
}

fn copy_file(source: &Path, dest: &Path) -> StagingResult<()> {
    fs::copy(source, dest).map_err(StagingError::io(dest))?;
    debug!(from = %source.display(), to = %dest.display(), "copied asset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_folder_topology() {
        let folders = TemplateFolders::new(Path::new("/sites/templates"), "Corporate");
        assert_eq!(folders.root, Path::new("/sites/templates/Corporate"));
        assert_eq!(folders.master, Path::new("/sites/templates/Corporate/App_Master"));
        assert_eq!(
            folders.global,
            Path::new("/sites/templates/Corporate/App_Themes/Corporate/Global")
        );
        assert_eq!(
            folders.images,
            Path::new("/sites/templates/Corporate/App_Themes/Corporate/Images")
        );
        assert_eq!(
            folders.master_page(),
            Path::new("/sites/templates/Corporate/App_Master/page.master")
        );
    }

    #[test]
    fn test_stage_all_assets() {
        let dir = tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(work.join("css")).unwrap();
        fs::create_dir_all(work.join("images").join("nested")).unwrap();
        fs::write(work.join("page.master"), "<%@ Master %>").unwrap();
        fs::write(work.join("css").join("site.css"), "body {}").unwrap();
        fs::write(work.join("images").join("logo.png"), "png").unwrap();
        fs::write(work.join("images").join("nested").join("skip.png"), "png").unwrap();

        let root = dir.path().join("templates");
        let staged = stage_assets(&work, &root, "Corporate").unwrap();

        assert!(staged.master_copied);
        assert!(staged.theme_registration_required);
        assert_eq!(staged.images, vec![staged.folders.images.join("logo.png")]);
        assert_eq!(staged.stylesheets, vec![staged.folders.global.join("site.css")]);
        assert_eq!(staged.copied_files(), 3);
        assert_eq!(
            fs::read_to_string(staged.folders.master_page()).unwrap(),
            "<%@ Master %>"
        );
        assert!(!staged.folders.images.join("nested").exists());
    }

    #[test]
    fn test_missing_sources_are_skipped() {
        let dir = tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();

        let staged = stage_assets(&work, &dir.path().join("templates"), "Bare").unwrap();
        assert!(!staged.master_copied);
        assert!(!staged.theme_registration_required);
        assert_eq!(staged.copied_files(), 0);
        assert!(staged.folders.global.is_dir());
        assert!(staged.folders.images.is_dir());
        assert!(staged.folders.master.is_dir());
    }

    #[test]
    fn test_restaging_overwrites() {
        let dir = tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(work.join("css")).unwrap();
        let root = dir.path().join("templates");

        fs::write(work.join("css").join("site.css"), "v1").unwrap();
        stage_assets(&work, &root, "Corporate").unwrap();
        fs::write(work.join("css").join("site.css"), "v2").unwrap();
        let staged = stage_assets(&work, &root, "Corporate").unwrap();

        assert_eq!(fs::read_to_string(&staged.stylesheets[0]).unwrap(), "v2");
    }
}
