#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

use crate::domain::ports::{ConfigProvider, Screen};
use crate::render::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, Validate};
use std::path::Path;
use toml_config::{PaginationConfig, TomlConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS};

pub const DEFAULT_PROFILE_FILE: &str = "pms-console.toml";

/// Values given on the command line; each one beats the profile file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub format: Option<OutputFormat>,
}

/// Effective connection and display settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub format: OutputFormat,
    pub pagination: PaginationConfig,
}

impl Settings {
    pub fn from_sources(profile: Option<TomlConfig>, overrides: Overrides) -> Self {
        let (api, pagination, profile_format) = match profile {
            Some(profile) => {
                let format = profile.format();
                (Some(profile.api), profile.pagination, format)
            }
            None => (None, None, None),
        };

        Self {
            base_url: overrides
                .base_url
                .or_else(|| api.as_ref().map(|a| a.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: overrides
                .token
                .filter(|t| !t.trim().is_empty())
                .or_else(|| api.as_ref().and_then(|a| a.token.clone())),
            timeout_seconds: overrides
                .timeout_seconds
                .or_else(|| api.as_ref().and_then(|a| a.timeout_seconds))
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            format: overrides.format.or(profile_format).unwrap_or_default(),
            pagination: pagination.unwrap_or_default(),
        }
    }

    /// Loads `profile_path` if given, else `pms-console.toml` when present.
    pub fn load(profile_path: Option<&str>, overrides: Overrides) -> Result<Self> {
        let profile = match profile_path {
            Some(path) => {
                tracing::info!("📁 Loading profile from: {}", path);
                Some(TomlConfig::from_file(path)?)
            }
            None if Path::new(DEFAULT_PROFILE_FILE).exists() => {
                tracing::debug!("📁 Loading profile from: {}", DEFAULT_PROFILE_FILE);
                Some(TomlConfig::from_file(DEFAULT_PROFILE_FILE)?)
            }
            None => None,
        };
        if let Some(profile) = &profile {
            profile.validate()?;
        }
        Ok(Self::from_sources(profile, overrides))
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn page_size(&self, screen: Screen) -> usize {
        self.pagination.page_size(screen)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_url("base_url", &self.base_url)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        for screen in [
            Screen::Services,
            Screen::AssignedServices,
            Screen::ServiceRequests,
            Screen::Ledgers,
            Screen::JournalEntries,
        ] {
            crate::utils::validation::validate_range("page_size", self.page_size(screen), 1, 100)?;
        }
        Ok(())
    }
}
