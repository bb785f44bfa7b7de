use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `sheet.api_key`
pub const API_KEY_ENV: &str = "SHEETSTOCK_API_KEY";
/// Environment variable that overrides `sheet.spreadsheet_id`
pub const SPREADSHEET_ID_ENV: &str = "SHEETSTOCK_SPREADSHEET_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub spreadsheet_id: String,

    /// Cell range in A1 notation, e.g. "Sheet1!A:F"
    #[serde(default = "default_range")]
    pub range: String,

    /// Static API key. Leave unset and export SHEETSTOCK_API_KEY instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout; no timeout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            spreadsheet_id: String::new(),
            range: default_range(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_range() -> String {
    "Sheet1!A:F".to_string()
}

/// 0-based column indices. Must match the sheet's column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub sku: usize,
    pub name: usize,
    pub url: usize,
    pub current_stock: usize,
    pub image: usize,
    pub incoming_stock: usize,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            sku: 0,
            name: 1,
            url: 2,
            current_stock: 3,
            image: 4,
            incoming_stock: 5,
        }
    }
}

impl ColumnMapping {
    /// (field label, column index) pairs in field order
    pub fn fields(&self) -> [(&'static str, usize); 6] {
        [
            ("sku", self.sku),
            ("name", self.name),
            ("url", self.url),
            ("current_stock", self.current_stock),
            ("image", self.image),
            ("incoming_stock", self.incoming_stock),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Header labels in field order (sku, name, url, current_stock, image, incoming_stock).
    /// Empty disables header validation.
    #[serde(default)]
    pub expected_headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_no_image")]
    pub no_image_placeholder: String,
    #[serde(default = "default_broken_image")]
    pub broken_image_placeholder: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            no_image_placeholder: default_no_image(),
            broken_image_placeholder: default_broken_image(),
        }
    }
}

fn default_no_image() -> String {
    "No Image".to_string()
}

fn default_broken_image() -> String {
    "Image Not Found".to_string()
}

/// Optional hex color overrides (#RRGGBB or #RGB)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_low: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_high: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sheet: SheetConfig,

    #[serde(default)]
    pub columns: ColumnMapping,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("sheetstock");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path (or the default one), falling back to defaults.
    /// Environment credentials are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(_) => return Ok(AppConfig::default().with_env()),
            },
        };

        let config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match toml::from_str::<AppConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                    AppConfig::default()
                }
            }
        } else {
            tracing::warn!("No config at {}, using defaults", path.display());
            AppConfig::default()
        };

        Ok(config.with_env())
    }

    /// Write the config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Never persist credentials picked up from the environment
        let mut clean_config = self.clone();
        clean_config.sheet.api_key = None;

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(SPREADSHEET_ID_ENV).ok(),
        )
    }

    fn with_overrides(mut self, api_key: Option<String>, spreadsheet_id: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.sheet.api_key = Some(key);
        }
        if let Some(id) = spreadsheet_id.filter(|i| !i.trim().is_empty()) {
            self.sheet.spreadsheet_id = id;
        }
        self
    }
}
