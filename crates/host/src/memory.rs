//! In-memory host implementation.
//!
//! `MemoryHost` implements every collaborator trait on top of plain
//! collections guarded by `RwLock`s. It is used by tests and by the
//! command-line importer, where there is no real CMS to talk to.
//!
//! Besides storing what it is asked to store, it keeps a call log and can be
//! told to fail a given operation, so pipelines can be exercised against
//! host outages.
//!
//! # Example
//!
//! ```
//! use host::{HostOperation, HostServices, MemoryHost};
//! use std::sync::Arc;
//!
//! let host = Arc::new(MemoryHost::new().failing(HostOperation::Publish));
//! let services = HostServices::from_shared(host.clone());
//! let template = services.templates.create_template().unwrap();
//! assert!(host.saved_templates().is_empty());
//! assert!(!template.id.is_nil());
//! ```

use crate::{
    Album, AlbumId, AlbumSummary, AppearanceSection, AppearanceStore, CategoryId,
    Control, Culture, CultureSettings, HostError, HostResult, ImageId, ImageLibrary, ImageUpload,
    LifecycleStatus, PageTemplate, StoredImage, TemplateControl, TemplateDraft, TemplateId,
    TemplateLifecycle, TemplateService,
};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Operations of the host, used for the call log and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    CreateTemplate,
    CreateControl,
    SetControlCulture,
    SaveTemplate,
    EditTemplate,
    CheckOut,
    CheckIn,
    Publish,
    LoadAppearance,
    SaveAppearance,
    FindAlbums,
    CreateAlbum,
    UploadImage,
    FindLiveImage,
}

/// Localization flags reported through `CultureSettings`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localization {
    pub widget_translations: Option<bool>,
    pub multilingual: bool,
    pub ui_culture: Culture,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            widget_translations: None,
            multilingual: false,
            ui_culture: Culture::new("en"),
        }
    }
}

struct TemplateRecord {
    template: PageTemplate,
    saved: bool,
    status: Option<LifecycleStatus>,
}

/// In-memory implementation of all host collaborators
pub struct MemoryHost {
    templates: RwLock<Vec<TemplateRecord>>,
    appearance: RwLock<AppearanceSection>,
    appearance_saves: RwLock<usize>,
    albums: RwLock<Vec<Album>>,
    localization: RwLock<Localization>,
    custom_category: CategoryId,
    failing: RwLock<HashSet<HostOperation>>,
    calls: RwLock<Vec<HostOperation>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(Vec::new()),
            appearance: RwLock::new(AppearanceSection::default()),
            appearance_saves: RwLock::new(0),
            albums: RwLock::new(Vec::new()),
            localization: RwLock::new(Localization::default()),
            custom_category: CategoryId::new(),
            failing: RwLock::new(HashSet::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Start from an existing appearance section
    pub fn with_appearance(self, section: AppearanceSection) -> Self {
        *write(&self.appearance) = section;
        self
    }

    /// Set the localization flags
    pub fn with_localization(self, localization: Localization) -> Self {
        *write(&self.localization) = localization;
        self
    }

    /// Make `operation` fail with `HostError::Unavailable`
    pub fn failing(self, operation: HostOperation) -> Self {
        self.fail_on(operation);
        self
    }

    /// Make `operation` fail from now on
    pub fn fail_on(&self, operation: HostOperation) {
        write(&self.failing).insert(operation);
    }

    /// Stop failing `operation`
    pub fn recover(&self, operation: HostOperation) {
        write(&self.failing).remove(&operation);
    }

    /// Replace the localization flags
    pub fn set_localization(&self, localization: Localization) {
        *write(&self.localization) = localization;
    }

    /// Templates that were saved, in creation order
    pub fn saved_templates(&self) -> Vec<PageTemplate> {
        read(&self.templates)
            .iter()
            .filter(|r| r.saved)
            .map(|r| r.template.clone())
            .collect()
    }

    /// Saved state of a template
    pub fn template(&self, id: TemplateId) -> Option<PageTemplate> {
        read(&self.templates)
            .iter()
            .find(|r| r.saved && r.template.id == id)
            .map(|r| r.template.clone())
    }

    /// Lifecycle status of a template, if it has entered the lifecycle
    pub fn template_status(&self, id: TemplateId) -> Option<LifecycleStatus> {
        read(&self.templates)
            .iter()
            .find(|r| r.template.id == id)
            .and_then(|r| r.status)
    }

    /// Current appearance section
    pub fn appearance(&self) -> AppearanceSection {
        read(&self.appearance).clone()
    }

    /// How many times the appearance section was saved
    pub fn appearance_saves(&self) -> usize {
        *read(&self.appearance_saves)
    }

    /// All albums
    pub fn albums(&self) -> Vec<Album> {
        read(&self.albums).clone()
    }

    /// Operations invoked so far, in order
    pub fn calls(&self) -> Vec<HostOperation> {
        read(&self.calls).clone()
    }

    /// Record a call and fail it if requested
    fn enter(&self, operation: HostOperation) -> HostResult<()> {
        write(&self.calls).push(operation);
        if read(&self.failing).contains(&operation) {
            return Err(HostError::Unavailable(format!("{:?} failed", operation)));
        }
        Ok(())
    }

    fn transition(
        &self,
        operation: HostOperation,
        mut draft: TemplateDraft,
        allowed: &[LifecycleStatus],
        next: LifecycleStatus,
    ) -> HostResult<TemplateDraft> {
        self.enter(operation)?;

        if !allowed.contains(&draft.status) {
            let expected = allowed
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(HostError::InvalidState {
                expected,
                found: draft.status.to_string(),
            });
        }

        let mut templates = write(&self.templates);
        let record = templates
            .iter_mut()
            .find(|r| r.saved && r.template.id == draft.template_id)
            .ok_or_else(|| HostError::not_found(format!("template {}", draft.template_id)))?;

        record.status = Some(next);
        draft.status = next;
        Ok(draft)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateService for MemoryHost {
    fn create_template(&self) -> HostResult<PageTemplate> {
        self.enter(HostOperation::CreateTemplate)?;

        let template = PageTemplate::new(TemplateId::new());
        write(&self.templates).push(TemplateRecord {
            template: template.clone(),
            saved: false,
            status: None,
        });
        Ok(template)
    }

    fn create_control(&self, control: Control, sf_id: &str) -> HostResult<TemplateControl> {
        self.enter(HostOperation::CreateControl)?;

        Ok(TemplateControl {
            id: crate::ControlId::new(),
            sf_id: sf_id.to_string(),
            caption: control.caption().to_string(),
            culture: None,
            control,
        })
    }

    fn set_control_culture(
        &self,
        template: &PageTemplate,
        control: &mut TemplateControl,
        culture: Option<&Culture>,
    ) -> HostResult<()> {
        self.enter(HostOperation::SetControlCulture)?;

        if !read(&self.templates).iter().any(|r| r.template.id == template.id) {
            return Err(HostError::not_found(format!("template {}", template.id)));
        }
        control.culture = culture.cloned();
        Ok(())
    }

    fn save_template(&self, template: &PageTemplate) -> HostResult<()> {
        self.enter(HostOperation::SaveTemplate)?;

        let mut templates = write(&self.templates);
        let record = templates
            .iter_mut()
            .find(|r| r.template.id == template.id)
            .ok_or_else(|| HostError::not_found(format!("template {}", template.id)))?;

        record.template = template.clone();
        record.saved = true;
        tracing::debug!(template = %template.name, controls = template.controls.len(), "template saved");
        Ok(())
    }

    fn edit_template(&self, id: TemplateId) -> HostResult<TemplateDraft> {
        self.enter(HostOperation::EditTemplate)?;

        let mut templates = write(&self.templates);
        let record = templates
            .iter_mut()
            .find(|r| r.saved && r.template.id == id)
            .ok_or_else(|| HostError::not_found(format!("template {}", id)))?;

        record.status = Some(LifecycleStatus::Draft);
        Ok(TemplateDraft::new(id))
    }

    fn custom_templates_category(&self) -> CategoryId {
        self.custom_category
    }
}

impl TemplateLifecycle for MemoryHost {
    fn check_out(&self, draft: TemplateDraft) -> HostResult<TemplateDraft> {
        self.transition(
            HostOperation::CheckOut,
            draft,
            &[LifecycleStatus::Draft, LifecycleStatus::CheckedIn],
            LifecycleStatus::CheckedOut,
        )
    }

    fn check_in(&self, draft: TemplateDraft) -> HostResult<TemplateDraft> {
        self.transition(
            HostOperation::CheckIn,
            draft,
            &[LifecycleStatus::CheckedOut],
            LifecycleStatus::CheckedIn,
        )
    }

    fn publish(&self, draft: TemplateDraft) -> HostResult<TemplateDraft> {
        self.transition(
            HostOperation::Publish,
            draft,
            &[LifecycleStatus::CheckedIn],
            LifecycleStatus::Published,
        )
    }
}

impl AppearanceStore for MemoryHost {
    fn load_appearance(&self) -> HostResult<AppearanceSection> {
        self.enter(HostOperation::LoadAppearance)?;
        Ok(read(&self.appearance).clone())
    }

    fn save_appearance(&self, section: &AppearanceSection) -> HostResult<()> {
        self.enter(HostOperation::SaveAppearance)?;
        *write(&self.appearance) = section.clone();
        *write(&self.appearance_saves) += 1;
        Ok(())
    }
}

impl ImageLibrary for MemoryHost {
    fn find_albums(&self, title: &str) -> HostResult<Vec<AlbumSummary>> {
        self.enter(HostOperation::FindAlbums)?;
        Ok(read(&self.albums)
            .iter()
            .filter(|a| a.title == title)
            .map(Album::summary)
            .collect())
    }

    fn create_album(&self, title: &str, description: &str) -> HostResult<AlbumId> {
        self.enter(HostOperation::CreateAlbum)?;

        let album = Album {
            id: AlbumId::new(),
            title: title.to_string(),
            description: description.to_string(),
            images: Vec::new(),
        };
        let id = album.id;
        write(&self.albums).push(album);
        Ok(id)
    }

    fn upload_image(&self, album: AlbumId, upload: ImageUpload) -> HostResult<ImageId> {
        self.enter(HostOperation::UploadImage)?;

        let mut albums = write(&self.albums);
        let target = albums
            .iter_mut()
            .find(|a| a.id == album)
            .ok_or_else(|| HostError::not_found(format!("album {}", album)))?;

        let image = StoredImage {
            id: ImageId::new(),
            title: upload.title,
            description: upload.description,
            url_name: upload.url_name,
            extension: upload.extension,
            size: upload.data.len(),
        };
        let id = image.id;
        target.images.push(image);
        Ok(id)
    }

    fn find_live_image(
        &self,
        album_title: &str,
        image_title: &str,
    ) -> HostResult<Option<ImageId>> {
        self.enter(HostOperation::FindLiveImage)?;

        let albums = read(&self.albums);
        let Some(album) = albums.iter().find(|a| a.title == album_title) else {
            return Ok(None);
        };

        Ok(album
            .images
            .iter()
            .find(|i| i.title == image_title)
            .map(|i| i.id))
    }
}

impl CultureSettings for MemoryHost {
    fn widget_translations_enabled(&self) -> Option<bool> {
        read(&self.localization).widget_translations
    }

    fn is_multilingual(&self) -> bool {
        read(&self.localization).multilingual
    }

    fn current_ui_culture(&self) -> Culture {
        read(&self.localization).ui_culture.clone()
    }
}
