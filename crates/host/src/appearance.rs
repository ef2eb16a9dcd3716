//! Appearance configuration: the host's registry of front-end themes

use serde::{Deserialize, Serialize};

/// A registered front-end theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeElement {
    /// Theme name, unique within the section
    pub name: String,
    /// Virtual path of the theme folder
    pub path: String,
}

impl ThemeElement {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The appearance configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceSection {
    /// Registered front-end themes in registration order
    pub frontend_themes: Vec<ThemeElement>,
    /// Name of the default front-end theme
    pub default_frontend_theme: Option<String>,
}

impl AppearanceSection {
    /// Check whether a theme with this name is registered
    pub fn contains_theme(&self, name: &str) -> bool {
        self.frontend_themes.iter().any(|t| t.name == name)
    }

    /// Get a registered theme by name
    pub fn theme(&self, name: &str) -> Option<&ThemeElement> {
        self.frontend_themes.iter().find(|t| t.name == name)
    }

    /// Register a theme unless one with the same name exists.
    ///
    /// Returns `true` if the theme was added.
    pub fn add_theme(&mut self, theme: ThemeElement) -> bool {
        if self.contains_theme(&theme.name) {
            return false;
        }
        self.frontend_themes.push(theme);
        true
    }
}
