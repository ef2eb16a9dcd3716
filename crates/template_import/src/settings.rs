//! Importer settings
//!
//! Settings live in `importer.json`. Every field has a default, so a partial
//! file only overrides what it names.

use crate::SettingsResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name
pub const SETTINGS_FILE: &str = "importer.json";

/// Main importer settings container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImporterSettings {
    /// Filesystem and virtual path roots
    pub paths: PathSettings,
    /// Layout document name inside the archive
    pub layout_file: String,
    /// Host control templates
    pub controls: ControlSettings,
    /// Image album settings
    pub images: ImageSettings,
}

impl ImporterSettings {
    /// Virtual path of the theme folder of `name`
    pub fn virtual_theme_path(&self, name: &str) -> String {
        format!(
            "{}/{}/App_Themes/{}",
            self.paths.virtual_templates_root.trim_end_matches('/'),
            name,
            name
        )
    }

    /// Virtual path of the master layout file of `name`
    pub fn virtual_master_page(&self, name: &str) -> String {
        format!(
            "{}/{}/App_Master/page.master",
            self.paths.virtual_templates_root.trim_end_matches('/'),
            name
        )
    }
}

/// Path settings, relative to the application root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathSettings {
    /// Parent of the per-import working directories
    pub temp_root: PathBuf,
    /// Installation root of imported templates
    pub templates_root: PathBuf,
    /// Host virtual path matching `templates_root`
    pub virtual_templates_root: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: PathBuf::from("App_Data"),
            templates_root: ["App_Data", "Sitefinity", "WebsiteTemplates"].iter().collect(),
            virtual_templates_root: "~/App_Data/Sitefinity/WebsiteTemplates".to_string(),
        }
    }
}

/// Layout templates of the produced host controls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ControlSettings {
    pub content_block_template: String,
    pub image_template: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            content_block_template:
                "~/SFRes/Telerik.Sitefinity.Resources.Templates.Backend.GenericContent.ContentBlock.ascx"
                    .to_string(),
            image_template:
                "~/SFRes/Telerik.Sitefinity.Resources.Templates.PublicControls.ImageControl.ascx"
                    .to_string(),
        }
    }
}

/// Image album settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageSettings {
    /// Description of albums created by the importer
    pub album_description: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            album_description: "Images imported from template".to_string(),
        }
    }
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            layout_file: crate::LAYOUT_FILE.to_string(),
            controls: ControlSettings::default(),
            images: ImageSettings::default(),
        }
    }
}

/// Settings loader
pub struct SettingsLoader {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Current settings (cached)
    current: ImporterSettings,
}

impl SettingsLoader {
    /// Create a loader for `importer.json` in `dir`
    pub fn new(dir: &Path) -> Self {
        Self::from_file(dir.join(SETTINGS_FILE))
    }

    /// Create a loader for an explicit settings file
    pub fn from_file(settings_path: PathBuf) -> Self {
        Self {
            settings_path,
            current: ImporterSettings::default(),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub async fn load(&mut self) -> SettingsResult<&ImporterSettings> {
        self.current = if self.settings_path.exists() {
            let content = tokio::fs::read_to_string(&self.settings_path).await?;
            Self::parse(&self.settings_path, &content)
        } else {
            ImporterSettings::default()
        };
        Ok(&self.current)
    }

    fn parse(path: &Path, content: &str) -> ImporterSettings {
        match serde_json::from_str::<ImporterSettings>(content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Failed to parse settings file, using defaults: {}",
                    e
                );
                ImporterSettings::default()
            }
        }
    }

    /// Save current settings to disk
    pub async fn save(&self) -> SettingsResult<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    /// Take ownership of the current settings
    pub fn into_settings(self) -> ImporterSettings {
        self.current
    }
}
