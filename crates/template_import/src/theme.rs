//! Theme registration with the host appearance configuration

use host::{AppearanceStore, HostResult, ThemeElement};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a theme registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeRegistration {
    pub name: String,
    pub path: String,
    /// False when a theme with this name was already registered
    pub added: bool,
}

/// Register `name` as a front-end theme and make it the default.
///
/// The entry is only added when no theme of that name exists, but the
/// default-theme pointer is always moved and the section always saved.
pub fn register_theme(
    store: &dyn AppearanceStore,
    name: &str,
    virtual_path: &str,
) -> HostResult<ThemeRegistration> {
    let mut section = store.load_appearance()?;

    let added = section.add_theme(ThemeElement::new(name, virtual_path));
    if !added {
        debug!(theme = name, "theme already registered");
    }
    section.default_frontend_theme = Some(name.to_string());

    store.save_appearance(&section)?;
    info!(theme = name, path = virtual_path, added, "registered front-end theme");

    Ok(ThemeRegistration {
        name: name.to_string(),
        path: virtual_path.to_string(),
        added,
    })
}
