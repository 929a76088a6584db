//! Process-wide series settings.
//!
//! Settings are read from the environment on first use unless the embedding
//! application installs its own beforehand.

use std::sync::OnceLock;

use pgseries_result::{Error, Result};
use pgseries_types::AutoFieldKind;
use tracing::debug;

/// Environment variable naming the identity column kind.
pub const DEFAULT_AUTO_FIELD_ENV: &str = "PGSERIES_DEFAULT_AUTO_FIELD";

static SETTINGS: OnceLock<SeriesSettings> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesSettings {
    /// Kind of the `id` column synthesized for `include_id` series.
    pub default_auto_field: AutoFieldKind,
}

impl SeriesSettings {
    /// Build settings from an optional auto-field name.
    pub fn from_auto_field(value: Option<&str>) -> Result<Self> {
        let default_auto_field = match value {
            Some(text) if !text.trim().is_empty() => text.parse()?,
            _ => AutoFieldKind::default(),
        };
        Ok(Self { default_auto_field })
    }

    /// Read settings from [`DEFAULT_AUTO_FIELD_ENV`].
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(DEFAULT_AUTO_FIELD_ENV).ok();
        Self::from_auto_field(value.as_deref())
    }

    /// Make these the process-wide settings. Fails once settings have been
    /// installed or loaded.
    pub fn install(self) -> Result<()> {
        SETTINGS.set(self).map_err(|_| {
            Error::Config("series settings are already initialized for this process".into())
        })?;
        debug!(settings = ?self, "installed series settings");
        Ok(())
    }
}

/// The process-wide settings, loading them from the environment on first use.
pub fn settings() -> Result<&'static SeriesSettings> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }
    let loaded = SeriesSettings::from_env()?;
    debug!(?loaded, "loaded series settings from the environment");
    Ok(SETTINGS.get_or_init(|| loaded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_auto_field() {
        let settings = SeriesSettings::from_auto_field(None).unwrap();
        assert_eq!(settings.default_auto_field, AutoFieldKind::AutoField);
        let settings = SeriesSettings::from_auto_field(Some("  ")).unwrap();
        assert_eq!(settings.default_auto_field, AutoFieldKind::AutoField);
    }

    #[test]
    fn unknown_auto_field_is_a_config_error() {
        assert!(matches!(
            SeriesSettings::from_auto_field(Some("app.models.HashField")),
            Err(Error::Config(_))
        ));
        let settings = SeriesSettings::from_auto_field(Some("django.db.models.UUIDField")).unwrap();
        assert_eq!(settings.default_auto_field, AutoFieldKind::UUIDField);
    }
}
