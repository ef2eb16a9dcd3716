//! Collaborator interfaces consumed by the template importer.
//!
//! Each trait covers one host subsystem. Implementations are shared across
//! threads, so every method takes `&self` and relies on internal locking
//! (e.g. `RwLock`). The host is assumed to serialize writers itself; nothing
//! here is transactional across calls.

use crate::{
    AlbumId, AlbumSummary, AppearanceSection, CategoryId, Control, Culture, HostResult, ImageId,
    ImageUpload, PageTemplate, TemplateControl, TemplateDraft, TemplateId,
};
use std::sync::Arc;

/// Page template and control creation
pub trait TemplateService: Send + Sync {
    /// Create a new empty template owned by the current unit of work
    fn create_template(&self) -> HostResult<PageTemplate>;

    /// Create a template control for `control`, keyed by `sf_id`
    fn create_control(&self, control: Control, sf_id: &str) -> HostResult<TemplateControl>;

    /// Bind a control of `template` to a culture (`None` = culture-neutral)
    fn set_control_culture(
        &self,
        template: &PageTemplate,
        control: &mut TemplateControl,
        culture: Option<&Culture>,
    ) -> HostResult<()>;

    /// Persist the template and its controls
    fn save_template(&self, template: &PageTemplate) -> HostResult<()>;

    /// Obtain an editable draft of a saved template
    fn edit_template(&self, id: TemplateId) -> HostResult<TemplateDraft>;

    /// Category that imported templates are filed under
    fn custom_templates_category(&self) -> CategoryId;
}

/// Draft lifecycle transitions
pub trait TemplateLifecycle: Send + Sync {
    fn check_out(&self, draft: TemplateDraft) -> HostResult<TemplateDraft>;

    fn check_in(&self, draft: TemplateDraft) -> HostResult<TemplateDraft>;

    fn publish(&self, draft: TemplateDraft) -> HostResult<TemplateDraft>;
}

/// Appearance configuration store
pub trait AppearanceStore: Send + Sync {
    fn load_appearance(&self) -> HostResult<AppearanceSection>;

    fn save_appearance(&self, section: &AppearanceSection) -> HostResult<()>;
}

/// Image library and albums
pub trait ImageLibrary: Send + Sync {
    /// Albums whose title equals `title`
    fn find_albums(&self, title: &str) -> HostResult<Vec<AlbumSummary>>;

    fn create_album(&self, title: &str, description: &str) -> HostResult<AlbumId>;

    /// Upload an image: check out, store content, check in and publish
    fn upload_image(&self, album: AlbumId, upload: ImageUpload) -> HostResult<ImageId>;

    /// Find a live image titled `image_title` in the first album titled
    /// `album_title`
    fn find_live_image(&self, album_title: &str, image_title: &str)
        -> HostResult<Option<ImageId>>;
}

/// Localization flags of the host
pub trait CultureSettings: Send + Sync {
    /// Widget translation switch; `None` when never configured
    fn widget_translations_enabled(&self) -> Option<bool>;

    fn is_multilingual(&self) -> bool;

    fn current_ui_culture(&self) -> Culture;
}

/// The set of host collaborators handed to an import
#[derive(Clone)]
pub struct HostServices {
    pub templates: Arc<dyn TemplateService>,
    pub lifecycle: Arc<dyn TemplateLifecycle>,
    pub appearance: Arc<dyn AppearanceStore>,
    pub images: Arc<dyn ImageLibrary>,
    pub culture: Arc<dyn CultureSettings>,
}

impl HostServices {
    /// Build the bundle from one host implementing every collaborator
    pub fn from_shared<H>(host: Arc<H>) -> Self
    where
        H: TemplateService
            + TemplateLifecycle
            + AppearanceStore
            + ImageLibrary
            + CultureSettings
            + 'static,
    {
        Self {
            templates: host.clone(),
            lifecycle: host.clone(),
            appearance: host.clone(),
            images: host.clone(),
            culture: host,
        }
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}
