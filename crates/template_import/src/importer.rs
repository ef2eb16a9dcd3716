//! Import orchestration
//!
//! One run moves through `Created → Extracted → Parsed → Staged → Mapped →
//! Published → Done`, or ends in `Failed`. Cancellation is checked before
//! every transition. The working directory and the source archive are
//! removed after every run, whatever the outcome; cleanup problems are
//! reported but never change the result.
//!
//! Nothing is rolled back. Folders, copied assets, theme registration,
//! uploaded images and a saved template all survive a later failure and are
//! listed in [`ImportReport::side_effects`].

use crate::{
    extract_archive, parse_layout_file, register_theme, upload_album_images, copy_assets,
    CancellationFlag, CleanupIssue, ErrorKind, ExtractionError, ImportError, ImportResult,
    ImporterSettings, MappingError, PublishError, PublishResult, PublishStep, StagingError,
    TemplateFolders, WidgetMapper, WorkingDirectory,
};
use host::{AlbumId, HostServices, PageTemplate, TemplateDraft, TemplateId};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// States of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Created,
    Extracted,
    Parsed,
    Staged,
    Mapped,
    Published,
    Done,
    Failed,
}

impl ImportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Extracted => "extracted",
            Self::Parsed => "parsed",
            Self::Staged => "staged",
            Self::Mapped => "mapped",
            Self::Published => "published",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// An irreversible change applied by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SideEffect {
    /// Template installation folders were created
    FoldersCreated { root: PathBuf },
    /// Assets were copied into the installation folders
    AssetsCopied { files: usize },
    /// The theme was registered and made the default front-end theme
    ThemeRegistered { name: String, added: bool },
    /// Images were uploaded into the template album
    ImagesUploaded { album: AlbumId, count: usize },
    /// The template was saved in the host
    TemplateSaved { template: TemplateId },
    /// The template went through the publish transition
    TemplatePublished { template: TemplateId },
}

/// Outcome of an import run
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub archive: PathBuf,
    pub working_directory: Option<PathBuf>,
    /// Visited states, ending in `Done` or `Failed`
    pub trail: Vec<ImportState>,
    /// The template object, once the host created it
    pub template: Option<PageTemplate>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ImportError>,
    pub side_effects: Vec<SideEffect>,
    pub cleanup_issues: Vec<CleanupIssue>,
}

impl ImportReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn final_state(&self) -> ImportState {
        self.trail.last().copied().unwrap_or(ImportState::Created)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ImportError::kind)
    }

    pub fn visited(&self, state: ImportState) -> bool {
        self.trail.contains(&state)
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<ImportError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        None => serializer.serialize_none(),
        Some(e) => {
            let mut state = serializer.serialize_struct("ImportError", 2)?;
            state.serialize_field("kind", &e.kind())?;
            state.serialize_field("message", &e.to_string())?;
            state.end()
        }
    }
}

/// Mutable state of one run
struct Run {
    trail: Vec<ImportState>,
    template: Option<PageTemplate>,
    side_effects: Vec<SideEffect>,
    workdir: Option<WorkingDirectory>,
}

/// Imports one template archive into the host
pub struct TemplateImporter {
    archive_file_name: PathBuf,
    app_root: PathBuf,
    services: HostServices,
    settings: ImporterSettings,
    cancellation: CancellationFlag,
}

impl TemplateImporter {
    /// Importer for `<app_root>/<archive_file_name>`
    pub fn new(
        archive_file_name: impl Into<PathBuf>,
        app_root: impl Into<PathBuf>,
        services: HostServices,
    ) -> Self {
        Self {
            archive_file_name: archive_file_name.into(),
            app_root: app_root.into(),
            services,
            settings: ImporterSettings::default(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_settings(mut self, settings: ImporterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Handle for cancelling this importer from elsewhere
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn archive_path(&self) -> PathBuf {
        self.app_root.join(&self.archive_file_name)
    }

    pub fn installation_root(&self) -> PathBuf {
        self.app_root.join(&self.settings.paths.templates_root)
    }

    /// Run the import and report only whether it succeeded
    pub fn import(&self) -> bool {
        self.run().succeeded()
    }

    /// Run the import
    pub fn run(&self) -> ImportReport {
        let archive = self.archive_path();
        info!(archive = %archive.display(), "starting template import");

        let mut run = Run {
            trail: vec![ImportState::Created],
            template: None,
            side_effects: Vec::new(),
            workdir: None,
        };

        let outcome = self.execute(&archive, &mut run);
        let cleanup_issues = self.cleanup(&archive, run.workdir.as_ref());

        let error = match outcome {
            Ok(()) => {
                advance(&mut run.trail, ImportState::Done);
                info!(archive = %archive.display(), "template import succeeded");
                None
            }
            Err(e) => {
                advance(&mut run.trail, ImportState::Failed);
                error!(archive = %archive.display(), kind = ?e.kind(), "template import failed: {}", e);
                Some(e)
            }
        };

        ImportReport {
            archive,
            working_directory: run.workdir.map(|w| w.path().to_path_buf()),
            trail: run.trail,
            template: run.template,
            error,
            side_effects: run.side_effects,
            cleanup_issues,
        }
    }

    fn execute(&self, archive: &Path, run: &mut Run) -> ImportResult<()> {
        let created = self
            .services
            .templates
            .create_template()
            .map_err(MappingError::Host)?;
        let template = run.template.insert(created);

        // Created → Extracted
        self.checkpoint(ImportState::Extracted)?;
        let temp_root = self.app_root.join(&self.settings.paths.temp_root);
        let workdir = run.workdir.insert(
            WorkingDirectory::allocate(&temp_root).map_err(ExtractionError::Io)?,
        );
        let work = workdir.path().to_path_buf();
        let extracted = extract_archive(archive, &work)?;
        debug!(
            files = extracted.files.len(),
            directories = extracted.directories,
            dir = %work.display(),
            "archive extracted"
        );
        advance(&mut run.trail, ImportState::Extracted);

        // Extracted → Parsed
        self.checkpoint(ImportState::Parsed)?;
        let schema = parse_layout_file(&work.join(&self.settings.layout_file))?
            .ok_or(ImportError::EmptySchema)?;
        let name = schema.template_name()?;
        template.set_name(name.as_str());
        advance(&mut run.trail, ImportState::Parsed);

        // Parsed → Staged
        self.checkpoint(ImportState::Staged)?;
        let folders = TemplateFolders::new(&self.installation_root(), &name);
        folders.create()?;
        run.side_effects.push(SideEffect::FoldersCreated {
            root: folders.root.clone(),
        });

        let staged = copy_assets(&work, folders)?;
        if staged.copied_files() > 0 {
            run.side_effects.push(SideEffect::AssetsCopied {
                files: staged.copied_files(),
            });
        }

        if staged.theme_registration_required {
            let registration = register_theme(
                self.services.appearance.as_ref(),
                &name,
                &self.settings.virtual_theme_path(&name),
            )
            .map_err(StagingError::from)?;
            template.theme = Some(name.clone());
            run.side_effects.push(SideEffect::ThemeRegistered {
                name: registration.name,
                added: registration.added,
            });
        }

        let upload = upload_album_images(
            self.services.images.as_ref(),
            &staged.folders.images,
            &name,
            &self.settings.images.album_description,
        )?;
        if let Some(album) = upload.album {
            run.side_effects.push(SideEffect::ImagesUploaded {
                album,
                count: upload.uploaded,
            });
        }
        advance(&mut run.trail, ImportState::Staged);

        // Staged → Mapped, only with a layout
        let Some(layout) = schema.layout.as_ref() else {
            info!(template = %name, "layout absent, template not registered");
            return Ok(());
        };

        self.checkpoint(ImportState::Mapped)?;
        template.category = self.services.templates.custom_templates_category();
        template.master_page = Some(self.settings.virtual_master_page(&name));
        let mapper = WidgetMapper::new(&self.services, &self.settings.controls);
        let summary = mapper.map_layout(layout, template)?;
        info!(template = %name, controls = summary.produced, skipped = summary.skipped, "widgets mapped");
        advance(&mut run.trail, ImportState::Mapped);

        // Mapped → Published
        self.checkpoint(ImportState::Published)?;
        self.publish(template, &mut run.side_effects)?;
        advance(&mut run.trail, ImportState::Published);

        Ok(())
    }

    /// Save the template, then check it out, check it in and publish it
    fn publish(
        &self,
        template: &PageTemplate,
        side_effects: &mut Vec<SideEffect>,
    ) -> PublishResult<TemplateDraft> {
        let templates = &self.services.templates;
        let lifecycle = &self.services.lifecycle;

        templates
            .save_template(template)
            .map_err(PublishError::at(PublishStep::Save))?;
        side_effects.push(SideEffect::TemplateSaved {
            template: template.id,
        });

        let draft = templates
            .edit_template(template.id)
            .map_err(PublishError::at(PublishStep::Edit))?;
        let draft = lifecycle
            .check_out(draft)
            .map_err(PublishError::at(PublishStep::CheckOut))?;
        let draft = lifecycle
            .check_in(draft)
            .map_err(PublishError::at(PublishStep::CheckIn))?;
        let draft = lifecycle
            .publish(draft)
            .map_err(PublishError::at(PublishStep::Publish))?;

        side_effects.push(SideEffect::TemplatePublished {
            template: template.id,
        });
        Ok(draft)
    }

    fn checkpoint(&self, before: ImportState) -> ImportResult<()> {
        if self.cancellation.is_cancelled() {
            warn!(before = %before, "import cancelled");
            return Err(ImportError::Cancelled { before });
        }
        Ok(())
    }

    /// Remove the working directory and the archive
    fn cleanup(&self, archive: &Path, workdir: Option<&WorkingDirectory>) -> Vec<CleanupIssue> {
        let mut issues = Vec::new();

        if let Some(workdir) = workdir {
            if let Err(e) = workdir.remove() {
                warn!(path = %workdir.path().display(), "failed to remove working directory: {}", e);
                issues.push(CleanupIssue::new(workdir.path(), &e));
            }
        }

        match fs::remove_file(archive) {
            Ok(()) => debug!(archive = %archive.display(), "archive deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(archive = %archive.display(), "failed to delete archive: {}", e);
                issues.push(CleanupIssue::new(archive, &e));
            }
        }

        issues
    }
}

/// Record a transition; nothing follows `Done` or `Failed`
fn advance(trail: &mut Vec<ImportState>, next: ImportState) {
    if let Some(last) = trail.last().filter(|s| s.is_terminal()) {
        warn!(state = %next, last = %last, "import already finished, ignoring transition");
        return;
    }
    info!(state = %next, "import state");
    trail.push(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use host::MemoryHost;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_archive_fails_and_cleans_up() {
        let dir = tempdir().unwrap();
        let services = HostServices::from_shared(Arc::new(MemoryHost::new()));
        let importer = TemplateImporter::new("missing.zip", dir.path(), services);

        let report = importer.run();
        assert!(!report.succeeded());
        assert_eq!(report.error_kind(), Some(ErrorKind::Extraction));
        assert_eq!(report.trail, vec![ImportState::Created, ImportState::Failed]);
        assert!(report.cleanup_issues.is_empty());
        assert!(!report.working_directory.unwrap().exists());
    }

    #[test]
    fn test_cancelled_before_extraction() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("template.zip");
        fs::write(&archive, b"unused").unwrap();

        let services = HostServices::from_shared(Arc::new(MemoryHost::new()));
        let importer = TemplateImporter::new("template.zip", dir.path(), services);
        importer.cancellation().cancel();

        let report = importer.run();
        assert!(matches!(
            report.error,
            Some(ImportError::Cancelled {
                before: ImportState::Extracted
            })
        ));
        assert_eq!(report.final_state(), ImportState::Failed);
        assert!(report.working_directory.is_none());
        assert!(!archive.exists());
    }

    #[test]
    fn test_report_serializes_error() {
        let dir = tempdir().unwrap();
        let services = HostServices::from_shared(Arc::new(MemoryHost::new()));
        let report = TemplateImporter::new("missing.zip", dir.path(), services).run();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"]["kind"], "extraction");
        assert_eq!(json["trail"][1], "failed");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ImportState::Published.to_string(), "published");
        assert!(ImportState::Failed.is_terminal());
        assert!(!ImportState::Staged.is_terminal());
    }

    #[test]
    fn test_no_transition_after_terminal_state() {
        let mut trail = vec![ImportState::Created];
        advance(&mut trail, ImportState::Extracted);
        advance(&mut trail, ImportState::Failed);
        advance(&mut trail, ImportState::Done);
        assert_eq!(
            trail,
            vec![ImportState::Created, ImportState::Extracted, ImportState::Failed]
        );
    }
}
