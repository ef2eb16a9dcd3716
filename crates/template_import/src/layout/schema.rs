//! Parsed layout schema

use super::{TITLE_ITEM, UNTITLED};
use crate::{SchemaError, SchemaResult};
use serde::Serialize;

/// A parsed layout document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutSchema {
    pub metadata: Option<Metadata>,
    pub layout: Option<Layout>,
}

impl LayoutSchema {
    /// Name for the imported template.
    ///
    /// Uses the first metadata item with id `title`. Falls back to
    /// [`UNTITLED`] when there is no metadata, no such item, or the title is
    /// blank. The name becomes a directory name, so anything that is not a
    /// single plain path segment is rejected.
    pub fn template_name(&self) -> SchemaResult<String> {
        let title = self
            .metadata
            .as_ref()
            .and_then(|m| m.get(TITLE_ITEM))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match title {
            None => Ok(UNTITLED.to_string()),
            Some(name) if is_safe_segment(name) => Ok(name.to_string()),
            Some(name) => Err(SchemaError::InvalidTemplateName(name.to_string())),
        }
    }
}

fn is_safe_segment(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

/// Template metadata: an ordered list of key/value items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub items: Vec<MetadataItem>,
}

impl Metadata {
    /// Value of the first item with this id
    pub fn get(&self, id: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataItem {
    pub id: String,
    pub value: String,
}

impl MetadataItem {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// The page layout: placeholders in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub placeholders: Vec<Placeholder>,
}

impl Layout {
    /// Every widget in placeholder, then column, document order
    pub fn widgets(&self) -> impl Iterator<Item = (WidgetPosition, &Widget)> + '_ {
        self.placeholders
            .iter()
            .enumerate()
            .flat_map(|(p, placeholder)| {
                placeholder
                    .layout_widget
                    .columns
                    .iter()
                    .enumerate()
                    .filter_map(move |(c, column)| {
                        column.widget.as_ref().map(|widget| {
                            (
                                WidgetPosition {
                                    placeholder: p,
                                    column: c,
                                },
                                widget,
                            )
                        })
                    })
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub layout_widget: LayoutWidget,
}

/// Column container of a placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutWidget {
    pub columns: Vec<Column>,
}

/// A layout column holding at most one widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Column {
    pub widget: Option<Widget>,
}

/// Where a widget sits in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidgetPosition {
    pub placeholder: usize,
    pub column: usize,
}

impl std::fmt::Display for WidgetPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}C{}", self.placeholder, self.column)
    }
}

/// Declarative description of one page element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub kind: WidgetKind,
    pub css_class: String,
    /// Cross-reference key for the produced control
    pub sf_id: String,
    pub properties: Option<WidgetProperties>,
}

impl Widget {
    pub fn text(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.text.as_deref())
            .unwrap_or_default()
    }

    pub fn filename(&self) -> Option<&str> {
        self.properties.as_ref().and_then(|p| p.filename.as_deref())
    }

    pub fn navigation_type(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.navigation_type.as_deref())
    }
}

/// Type-dependent widget settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetProperties {
    /// HTML body of a content block
    pub text: Option<String>,
    /// Image file name
    pub filename: Option<String>,
    /// Navigation control name
    pub navigation_type: Option<String>,
}

/// Recognized widget types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    ContentBlock,
    Image,
    Navigation,
    /// Anything else; carries the type string as written
    Unknown(String),
}

impl WidgetKind {
    /// Classify a type string, ignoring ASCII case
    pub fn parse(type_name: Option<&str>) -> Self {
        let Some(raw) = type_name else {
            return Self::Unknown(String::new());
        };

        match raw.to_ascii_lowercase().as_str() {
            "content block" => Self::ContentBlock,
            "image" => Self::Image,
            "navigation" => Self::Navigation,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn titled(items: Vec<MetadataItem>) -> LayoutSchema {
        LayoutSchema {
            metadata: Some(Metadata { items }),
            layout: None,
        }
    }

    fn widget(kind: WidgetKind) -> Widget {
        Widget {
            kind,
            css_class: String::new(),
            sf_id: String::new(),
            properties: None,
        }
    }

    #[test]
    fn test_template_name_fallbacks() {
        assert_eq!(LayoutSchema::default().template_name().unwrap(), UNTITLED);
        assert_eq!(titled(vec![]).template_name().unwrap(), UNTITLED);
        assert_eq!(
            titled(vec![MetadataItem::new("author", "me")])
                .template_name()
                .unwrap(),
            UNTITLED
        );
        assert_eq!(
            titled(vec![MetadataItem::new("title", "   ")])
                .template_name()
                .unwrap(),
            UNTITLED
        );
    }

    #[test]
    fn test_template_name_uses_first_title() {
        let schema = titled(vec![
            MetadataItem::new("author", "me"),
            MetadataItem::new("title", " Corporate "),
            MetadataItem::new("title", "Second"),
        ]);
        assert_eq!(schema.template_name().unwrap(), "Corporate");
    }

    #[test]
    fn test_template_name_rejects_paths() {
        for bad in ["..", ".", "a/b", "a\\b", "tab\there"] {
            let schema = titled(vec![MetadataItem::new("title", bad)]);
            assert!(
                matches!(
                    schema.template_name(),
                    Err(SchemaError::InvalidTemplateName(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_widgets_in_document_order() {
        let column = |kind| Column {
            widget: Some(widget(kind)),
        };
        let layout = Layout {
            placeholders: vec![
                Placeholder {
                    layout_widget: LayoutWidget {
                        columns: vec![column(WidgetKind::Image), Column::default()],
                    },
                },
                Placeholder {
                    layout_widget: LayoutWidget {
                        columns: vec![column(WidgetKind::Navigation)],
                    },
                },
            ],
        };

        let positions: Vec<String> = layout.widgets().map(|(pos, _)| pos.to_string()).collect();
        assert_eq!(positions, vec!["P0C0", "P1C0"]);
    }

    #[test]
    fn test_widget_kind_parse() {
        assert_eq!(WidgetKind::parse(Some("Content Block")), WidgetKind::ContentBlock);
        assert_eq!(WidgetKind::parse(Some("IMAGE")), WidgetKind::Image);
        assert_eq!(WidgetKind::parse(Some("navigation")), WidgetKind::Navigation);
        assert_eq!(
            WidgetKind::parse(Some("Video")),
            WidgetKind::Unknown("Video".to_string())
        );
        assert_eq!(WidgetKind::parse(None), WidgetKind::Unknown(String::new()));
    }

    #[test]
    fn test_widget_kind_padding_is_not_ignored() {
        assert_eq!(
            WidgetKind::parse(Some(" image ")),
            WidgetKind::Unknown(" image ".to_string())
        );
        assert_eq!(
            WidgetKind::parse(Some("Content Block\n")),
            WidgetKind::Unknown("Content Block\n".to_string())
        );
    }

    proptest! {
        #[test]
        fn prop_widget_kind_ignores_case(upper in proptest::collection::vec(any::<bool>(), 13)) {
            let name: String = "content block"
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(WidgetKind::parse(Some(name.as_str())), WidgetKind::ContentBlock);
        }

        #[test]
        fn prop_plain_titles_are_kept(title in "[A-Za-z0-9][A-Za-z0-9 _-]{0,30}[A-Za-z0-9]") {
            let schema = titled(vec![MetadataItem::new("title", title.clone())]);
            prop_assert_eq!(schema.template_name().unwrap(), title);
        }

        #[test]
        fn prop_titles_with_separators_are_rejected(
            head in "[a-z]{1,8}",
            sep in prop_oneof![Just('/'), Just('\\')],
            tail in "[a-z]{1,8}",
        ) {
            let schema = titled(vec![MetadataItem::new("title", format!("{}{}{}", head, sep, tail))]);
            prop_assert!(schema.template_name().is_err());
        }
    }
}
