//! Widget to host control mapping
//!
//! Walks the layout in placeholder, then column, document order and turns
//! every recognized widget into a host control. Unknown widget types are
//! skipped. Image widgets are resolved against the album named after the
//! template.

use crate::{resolve_culture, ControlSettings, Layout, MappingError, MappingResult, Widget, WidgetKind};
use host::{Control, HostServices, ImageId, NavigationMode, PageSelectionMode, PageTemplate};
use serde::Serialize;
use tracing::{debug, warn};

/// Counts of a mapping pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    pub produced: usize,
    pub skipped: usize,
}

/// Maps layout widgets onto host controls
pub struct WidgetMapper<'a> {
    services: &'a HostServices,
    controls: &'a ControlSettings,
}

impl<'a> WidgetMapper<'a> {
    pub fn new(services: &'a HostServices, controls: &'a ControlSettings) -> Self {
        Self { services, controls }
    }

    /// Create, register and append a control for every recognized widget
    pub fn map_layout(
        &self,
        layout: &Layout,
        template: &mut PageTemplate,
    ) -> MappingResult<MappingSummary> {
        let album_title = template.name.clone();
        let mut summary = MappingSummary::default();

        for (position, widget) in layout.widgets() {
            let Some(control) = self.build_control(widget, &album_title)? else {
                warn!(%position, kind = ?widget.kind, sf_id = %widget.sf_id, "skipping unrecognized widget");
                summary.skipped += 1;
                continue;
            };

            let mut registered = self
                .services
                .templates
                .create_control(control, &widget.sf_id)
                .map_err(MappingError::widget(&widget.sf_id))?;

            let culture = resolve_culture(self.services.culture.as_ref());
            self.services
                .templates
                .set_control_culture(template, &mut registered, culture.as_ref())
                .map_err(MappingError::widget(&widget.sf_id))?;

            debug!(%position, caption = %registered.caption, sf_id = %registered.sf_id, "mapped widget");
            template.controls.push(registered);
            summary.produced += 1;
        }

        Ok(summary)
    }

    /// Build the control for one widget; `None` for unrecognized types
    pub fn build_control(&self, widget: &Widget, album_title: &str) -> MappingResult<Option<Control>> {
        let control = match &widget.kind {
            WidgetKind::ContentBlock => Control::ContentBlock {
                html: widget.text().to_string(),
                css_class: widget.css_class.clone(),
                layout_template_path: self.controls.content_block_template.clone(),
            },
            WidgetKind::Image => Control::Image {
                image_id: self.resolve_image(widget, album_title)?,
                css_class: widget.css_class.clone(),
                layout_template_path: self.controls.image_template.clone(),
            },
            WidgetKind::Navigation => Control::Navigation {
                mode: navigation_mode(widget.navigation_type()),
                selection_mode: PageSelectionMode::TopLevelPages,
                skin: widget.css_class.clone(),
            },
            WidgetKind::Unknown(_) => return Ok(None),
        };
        Ok(Some(control))
    }

    /// Live image with the widget's file name in the album, or the nil id
    fn resolve_image(&self, widget: &Widget, album_title: &str) -> MappingResult<ImageId> {
        let Some(title) = widget.filename().map(image_title).filter(|t| !t.is_empty()) else {
            return Ok(ImageId::nil());
        };

        let found = self
            .services
            .images
            .find_live_image(album_title, title)
            .map_err(MappingError::widget(&widget.sf_id))?;

        Ok(found.unwrap_or_else(|| {
            debug!(album = album_title, image = title, "image not found, using empty id");
            ImageId::nil()
        }))
    }
}

/// Navigation mode for a `NavigationType` value.
///
/// Names match exactly; any other spelling falls back to horizontal simple.
pub fn navigation_mode(navigation_type: Option<&str>) -> NavigationMode {
    let Some(name) = navigation_type else {
        return NavigationMode::HorizontalSimple;
    };

    match name {
        "horizontalcontrol" => NavigationMode::HorizontalSimple,
        "horizontal2levelscontrol" => NavigationMode::HorizontalDropDownMenu,
        "tabscontrol" => NavigationMode::HorizontalTabs,
        "verticalcontrol" => NavigationMode::VerticalSimple,
        "treeviewcontrol" => NavigationMode::VerticalTree,
        "sitemapcontrol" => NavigationMode::SiteMapInColumns,
        _ => NavigationMode::HorizontalSimple,
    }
}

/// Final path segment of an image file name
pub fn image_title(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}
