//! Culture resolution for imported controls

use host::{Culture, CultureSettings};

/// Culture to bind a new control to.
///
/// Controls are culture-neutral (`None`) unless widget translations are
/// switched on and the host runs in multilingual mode, in which case they
/// are bound to the current UI culture.
pub fn resolve_culture(settings: &dyn CultureSettings) -> Option<Culture> {
    let translations = settings.widget_translations_enabled().unwrap_or(false);
    if !translations || !settings.is_multilingual() {
        return None;
    }
    Some(settings.current_ui_culture())
}
