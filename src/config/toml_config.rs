use crate::domain::ports::{ConfigProvider, Screen};
use crate::render::OutputFormat;
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection profile, `pms-console.toml` by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    pub pagination: Option<PaginationConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Page sizes (`limit`) per screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub services: Option<usize>,
    pub assigned_services: Option<usize>,
    pub service_requests: Option<usize>,
    pub ledgers: Option<usize>,
    pub journal_entries: Option<usize>,
}

impl PaginationConfig {
    pub fn page_size(&self, screen: Screen) -> usize {
        let configured = match screen {
            Screen::Services => self.services,
            Screen::AssignedServices => self.assigned_services,
            Screen::ServiceRequests => self.service_requests,
            Screen::Ledgers => self.ledgers,
            Screen::JournalEntries => self.journal_entries,
        };
        configured.unwrap_or_else(|| default_page_size(screen))
    }
}

pub fn default_page_size(screen: Screen) -> usize {
    match screen {
        Screen::Services | Screen::AssignedServices => 20,
        Screen::ServiceRequests => 10,
        Screen::Ledgers | Screen::JournalEntries => 50,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub format: Option<OutputFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConsoleError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| ConsoleError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // 未設定的 ${VAR} 會原樣保留，token 視為未提供
        if config
            .api
            .token
            .as_deref()
            .is_some_and(|t| t.contains("${") || t.trim().is_empty())
        {
            tracing::warn!("api.token references an unset environment variable, ignoring it");
            config.api.token = None;
        }
        Ok(config)
    }

    /// 替換環境變數 (例如 ${PMS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConsoleError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;

        if let Some(timeout) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }

        if let Some(pagination) = &self.pagination {
            for (field, value) in [
                ("pagination.services", pagination.services),
                ("pagination.assigned_services", pagination.assigned_services),
                ("pagination.service_requests", pagination.service_requests),
                ("pagination.ledgers", pagination.ledgers),
                ("pagination.journal_entries", pagination.journal_entries),
            ] {
                if let Some(value) = value {
                    validate_range(field, value, 1, 100)?;
                }
            }
        }
        Ok(())
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.display.as_ref().and_then(|d| d.format)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.api.base_url
    }

    fn token(&self) -> Option<&str> {
        self.api.token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn page_size(&self, screen: Screen) -> usize {
        self.pagination
            .as_ref()
            .map(|p| p.page_size(screen))
            .unwrap_or_else(|| default_page_size(screen))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
