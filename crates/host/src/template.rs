//! Page template model
//!
//! A page template is created empty, receives controls one by one, is saved
//! once, and then moves through the check-out / check-in / publish lifecycle.

use crate::{CategoryId, ControlId, Culture, ImageId, TemplateId};
use serde::{Deserialize, Serialize};

/// Navigation rendering modes supported by the host navigation control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NavigationMode {
    #[default]
    HorizontalSimple,
    HorizontalDropDownMenu,
    HorizontalTabs,
    VerticalSimple,
    VerticalTree,
    SiteMapInColumns,
}

impl std::fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HorizontalSimple => write!(f, "HorizontalSimple"),
            Self::HorizontalDropDownMenu => write!(f, "HorizontalDropDownMenu"),
            Self::HorizontalTabs => write!(f, "HorizontalTabs"),
            Self::VerticalSimple => write!(f, "VerticalSimple"),
            Self::VerticalTree => write!(f, "VerticalTree"),
            Self::SiteMapInColumns => write!(f, "SiteMapInColumns"),
        }
    }
}

/// Which pages a navigation control lists; imported navigation always
/// starts from the top-level pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSelectionMode {
    #[default]
    TopLevelPages,
}

/// A host control, ready to be placed on a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    /// Static HTML content
    ContentBlock {
        html: String,
        css_class: String,
        layout_template_path: String,
    },
    /// A single library image
    Image {
        image_id: ImageId,
        css_class: String,
        layout_template_path: String,
    },
    /// Site navigation
    Navigation {
        mode: NavigationMode,
        selection_mode: PageSelectionMode,
        skin: String,
    },
}

impl Control {
    /// Caption shown for the control in the host's designer
    pub fn caption(&self) -> &'static str {
        match self {
            Self::ContentBlock { .. } => "Content Block",
            Self::Image { .. } => "Image",
            Self::Navigation { .. } => "Navigation",
        }
    }
}

/// A control registered with the host and attached to a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateControl {
    /// Host-assigned identifier
    pub id: ControlId,
    /// Cross-reference key the control was registered under
    pub sf_id: String,
    /// Designer caption
    pub caption: String,
    /// Culture the control is bound to; `None` for culture-neutral controls
    pub culture: Option<Culture>,
    /// The control itself
    pub control: Control,
}

/// A page template under construction or stored by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    pub id: TemplateId,
    pub name: String,
    pub title: String,
    /// Theme applied to pages using the template
    pub theme: Option<String>,
    /// Virtual path of the master layout file
    pub master_page: Option<String>,
    pub category: CategoryId,
    /// Controls in placeholder/column document order
    pub controls: Vec<TemplateControl>,
}

impl PageTemplate {
    /// Create an empty, unnamed template
    pub fn new(id: TemplateId) -> Self {
        Self {
            id,
            name: String::new(),
            title: String::new(),
            theme: None,
            master_page: None,
            category: CategoryId::nil(),
            controls: Vec::new(),
        }
    }

    /// Set both name and title
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.title = name.clone();
        self.name = name;
    }
}

/// Lifecycle state of a template draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Editable draft obtained from `edit_template`
    Draft,
    /// Locked for editing
    CheckedOut,
    /// Changes committed to the master copy
    CheckedIn,
    /// Live and servable
    Published,
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::CheckedOut => write!(f, "checked out"),
            Self::CheckedIn => write!(f, "checked in"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// Handle passed between lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub template_id: TemplateId,
    pub status: LifecycleStatus,
}

impl TemplateDraft {
    pub fn new(template_id: TemplateId) -> Self {
        Self {
            template_id,
            status: LifecycleStatus::Draft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_name_sets_title() {
        let mut template = PageTemplate::new(TemplateId::new());
        template.set_name("Corporate");
        assert_eq!(template.name, "Corporate");
        assert_eq!(template.title, "Corporate");
        assert!(template.category.is_nil());
    }

    #[test]
    fn test_navigation_defaults() {
        assert_eq!(NavigationMode::default(), NavigationMode::HorizontalSimple);
        assert_eq!(PageSelectionMode::default(), PageSelectionMode::TopLevelPages);
    }

    #[test]
    fn test_control_captions() {
        let nav = Control::Navigation {
            mode: NavigationMode::default(),
            selection_mode: PageSelectionMode::default(),
            skin: String::new(),
        };
        assert_eq!(nav.caption(), "Navigation");

        let image = Control::Image {
            image_id: ImageId::nil(),
            css_class: String::new(),
            layout_template_path: String::new(),
        };
        assert_eq!(image.caption(), "Image");
    }

    #[test]
    fn test_control_serialization_is_tagged() {
        let block = Control::ContentBlock {
            html: "<p>hi</p>".to_string(),
            css_class: "intro".to_string(),
            layout_template_path: String::new(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "content_block");
        assert_eq!(json["html"], "<p>hi</p>");
    }
}
