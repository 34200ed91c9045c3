//! Settings loader that merges files and environment variables.

use super::RegistrySettings;
use crate::error::{RegistryError, Result};
use config::{Environment, File};
use std::path::{Path, PathBuf};

/// Loads [`RegistrySettings`] from layered sources.
///
/// Files are merged in the order they were added (later files override
/// earlier ones), then environment variables override every file.
///
/// # Examples
///
/// ```rust,no_run
/// use observer_registry::settings::RegistrySettings;
///
/// # fn example() -> observer_registry::error::Result<()> {
/// // APP_DELIVERY_POLICY=fail-fast overrides the file
/// let settings = RegistrySettings::loader()
///     .with_file("config/registry.toml")
///     .with_env_overrides("APP", "__")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
}

impl SettingsLoader {
    /// Create a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file source with automatic format detection.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Add environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__")
    ///
    /// The prefix is joined to the key with a single underscore, so
    /// `APP_REMOVAL_MODE=all` sets `removal_mode`.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Load and merge all sources.
    ///
    /// With no sources at all the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A file has an unsupported extension or does not exist
    /// - A file cannot be parsed
    /// - A value does not match the expected type
    pub fn load(&self) -> Result<RegistrySettings> {
        let mut builder = config::Config::builder();

        for path in &self.file_paths {
            validate_extension(path)?;
            if !path.exists() {
                return Err(RegistryError::LoadError(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        if let (Some(prefix), Some(separator)) = (&self.env_prefix, &self.env_separator) {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(separator),
            );
        }

        let config = builder
            .build()
            .map_err(|e| RegistryError::LoadError(format!("Failed to build settings: {}", e)))?;

        let settings = config.try_deserialize::<RegistrySettings>().map_err(|e| {
            RegistryError::DeserializationError(format!("Failed to deserialize settings: {}", e))
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(?settings, files = self.file_paths.len(), "registry settings loaded");

        Ok(settings)
    }
}

/// Validate that the file extension is supported.
fn validate_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            RegistryError::LoadError(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "yaml" | "yml" | "toml" | "json" => Ok(()),
        _ => Err(RegistryError::LoadError(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        ))),
    }
}

#[cfg(test)]
#[allow(unsafe_code)] // For env var manipulation in tests
mod tests {
    use super::*;
    use crate::core::{DeliveryPolicy, RemovalMode};
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension(Path::new("registry.yaml")).is_ok());
        assert!(validate_extension(Path::new("registry.yml")).is_ok());
        assert!(validate_extension(Path::new("registry.toml")).is_ok());
        assert!(validate_extension(Path::new("registry.json")).is_ok());
        assert!(validate_extension(Path::new("registry.txt")).is_err());
        assert!(validate_extension(Path::new("registry")).is_err());
    }

    #[test]
    fn test_no_sources_gives_defaults() {
        let settings = SettingsLoader::new().load().unwrap();
        assert_eq!(settings, RegistrySettings::default());
    }

    #[test]
    fn test_load_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("registry.yaml");
        fs::write(&path, "delivery_policy: fail-fast\nremoval_mode: all\n").unwrap();

        let settings = SettingsLoader::new().with_file(&path).load().unwrap();
        assert_eq!(settings.delivery_policy, DeliveryPolicy::FailFast);
        assert_eq!(settings.removal_mode, RemovalMode::All);
    }

    #[test]
    fn test_later_file_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("base.toml");
        let local = temp_dir.path().join("local.json");
        fs::write(&base, "delivery_policy = \"fail-fast\"\nremoval_mode = \"all\"\n").unwrap();
        fs::write(&local, r#"{ "delivery_policy": "best-effort" }"#).unwrap();

        let settings = SettingsLoader::new()
            .with_file(&base)
            .with_file(&local)
            .load()
            .unwrap();
        assert_eq!(settings.delivery_policy, DeliveryPolicy::BestEffort);
        assert_eq!(settings.removal_mode, RemovalMode::All);
    }

    #[test]
    fn test_missing_file() {
        let result = SettingsLoader::new()
            .with_file("/nonexistent/registry.yaml")
            .load();
        assert!(matches!(result, Err(RegistryError::LoadError(_))));
    }

    #[test]
    fn test_invalid_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("registry.yaml");
        fs::write(&path, "delivery_policy: sometimes\n").unwrap();

        let result = SettingsLoader::new().with_file(&path).load();
        assert!(matches!(result, Err(RegistryError::DeserializationError(_))));
    }

    #[test]
    fn test_builder_accumulates_files() {
        let loader = SettingsLoader::new()
            .with_file("a.yaml")
            .with_file("b.yaml")
            .with_env_overrides("APP", "__");

        assert_eq!(loader.file_paths.len(), 2);
        assert_eq!(loader.env_prefix.as_deref(), Some("APP"));
        assert_eq!(loader.env_separator.as_deref(), Some("__"));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("registry.yaml");
        fs::write(
            &path,
            "delivery_policy: best-effort\nremoval_mode: all\ncache_latest: false\n",
        )
        .unwrap();

        // Prefix is unique to this test so parallel tests never see it
        unsafe {
            env::set_var("OBSREG_LOADER_ENV_TEST_DELIVERY_POLICY", "fail-fast");
            env::set_var("OBSREG_LOADER_ENV_TEST_CACHE_LATEST", "true");
        }

        let result = SettingsLoader::new()
            .with_file(&path)
            .with_env_overrides("OBSREG_LOADER_ENV_TEST", "__")
            .load();

        unsafe {
            env::remove_var("OBSREG_LOADER_ENV_TEST_DELIVERY_POLICY");
            env::remove_var("OBSREG_LOADER_ENV_TEST_CACHE_LATEST");
        }

        let settings = result.unwrap();
        assert_eq!(settings.delivery_policy, DeliveryPolicy::FailFast);
        // Not set in the environment, so the file value stands
        assert_eq!(settings.removal_mode, RemovalMode::All);
        #[cfg(feature = "replay")]
        assert!(settings.cache_latest);
    }
}
