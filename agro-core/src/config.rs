use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{provider::ProviderId, units::TemperatureUnit};

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for a single provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Root of the dashboard backend, e.g. `http://localhost:5000`.
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self { base_url: Some(base_url.into()), api_key, timeout_secs: default_timeout_secs() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "dashboard" or "sample".
    pub default_provider: Option<String>,

    /// City used when a command is run without one.
    #[serde(default)]
    pub default_city: Option<String>,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Fill domains the primary provider failed to deliver with sample data.
    #[serde(default)]
    pub fallback_to_sample: bool,

    /// Example TOML:
    /// [providers.dashboard]
    /// base_url = "http://localhost:5000"
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `agro configure <provider>` (e.g. `agro configure dashboard`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// The explicit city if given, otherwise the configured default.
    pub fn resolve_city(&self, city: Option<String>) -> Result<String> {
        city.filter(|c| !c.trim().is_empty())
            .or_else(|| self.default_city.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No city given and no default city configured.\n\
                     Hint: pass a city, e.g. `agro show Kyiv`, or set one with `agro configure`."
                )
            })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "agro-dashboard", "agro")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider's settings; the first provider stored becomes the default.
    pub fn upsert_provider(&mut self, provider_id: ProviderId, provider: ProviderConfig) {
        self.providers.insert(provider_id.as_str().to_string(), provider);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.needs_config()
            || self
                .provider_config(provider_id)
                .is_some_and(|cfg| cfg.base_url.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn upsert_sets_default_and_stores_settings() {
        let mut cfg = Config::default();

        cfg.upsert_provider(
            ProviderId::Dashboard,
            ProviderConfig::new("http://localhost:5000", Some("KEY".into())),
        );

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::Dashboard);

        let stored = cfg.provider_config(ProviderId::Dashboard).expect("stored provider");
        assert_eq!(stored.api_key.as_deref(), Some("KEY"));
        assert_eq!(stored.timeout_secs, 30);
        assert!(cfg.is_provider_configured(ProviderId::Dashboard));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider(ProviderId::Sample, ProviderConfig::new("unused", None));
        cfg.upsert_provider(ProviderId::Dashboard, ProviderConfig::new("http://x", None));

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::Sample);

        cfg.set_default_provider(ProviderId::Dashboard);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::Dashboard);
    }

    #[test]
    fn sample_provider_counts_as_configured() {
        let cfg = Config::default();
        assert!(cfg.is_provider_configured(ProviderId::Sample));
        assert!(!cfg.is_provider_configured(ProviderId::Dashboard));
    }

    #[test]
    fn resolve_city_prefers_argument() {
        let mut cfg = Config::default();
        assert!(cfg.resolve_city(None).is_err());

        cfg.default_city = Some("Poltava".into());
        assert_eq!(cfg.resolve_city(None).unwrap(), "Poltava");
        assert_eq!(cfg.resolve_city(Some("Kyiv".into())).unwrap(), "Kyiv");
        assert_eq!(cfg.resolve_city(Some("  ".into())).unwrap(), "Poltava");
    }

    #[test]
    fn parses_full_toml() {
        let cfg = Config::from_toml(
            r#"
            default_provider = "dashboard"
            default_city = "Kyiv"
            temperature_unit = "fahrenheit"
            fallback_to_sample = true

            [providers.dashboard]
            base_url = "http://localhost:5000"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(cfg.temperature_unit, TemperatureUnit::Fahrenheit);
        assert!(cfg.fallback_to_sample);
        assert_eq!(cfg.provider_config(ProviderId::Dashboard).unwrap().timeout_secs, 10);
        assert!(cfg.provider_config(ProviderId::Dashboard).unwrap().api_key.is_none());
    }

    #[test]
    fn toml_roundtrip_keeps_settings() {
        let mut cfg = Config::default();
        cfg.upsert_provider(ProviderId::Dashboard, ProviderConfig::new("http://x", None));
        cfg.temperature_unit = TemperatureUnit::Kelvin;

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();

        assert_eq!(back.temperature_unit, TemperatureUnit::Kelvin);
        assert_eq!(back.provider_config(ProviderId::Dashboard), cfg.provider_config(ProviderId::Dashboard));
    }
}
