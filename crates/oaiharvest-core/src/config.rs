use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root configuration, loaded from `~/.config/oaiharvest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub site: SiteConfig,
    pub identifiers: IdentifierConfig,
    pub catalog: CatalogConfig,
    pub provider: ProviderConfig,
}

/// Site-level values handed to every reader and to the OAI-PMH provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_url: String,
    pub site_title: String,
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Prefix of freshly generated catalog identifiers.
    pub pid_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Page size of the OAI-PMH list verbs.
    pub batch_size: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5000".to_string(),
            site_title: "repository".to_string(),
            admin_emails: vec!["etsin@csc.fi".to_string()],
        }
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            pid_prefix: "urn:nbn:fi:csc-kata".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("oaiharvest");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl HarvestConfig {
    /// Standard config file path: `~/.config/oaiharvest/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("OAIHARVEST_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("oaiharvest")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Path to the SQLite catalog file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.data_dir).join("catalog.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = HarvestConfig::default();
        assert_eq!(cfg.site.site_title, "repository");
        assert_eq!(cfg.identifiers.pid_prefix, "urn:nbn:fi:csc-kata");
        assert_eq!(cfg.provider.batch_size, 100);
        assert!(!cfg.catalog.data_dir.is_empty());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = HarvestConfig::default();
        cfg.site.site_url = "https://etsin.example.org".to_string();
        cfg.save_to(&path).unwrap();

        let loaded = HarvestConfig::load_from(&path).unwrap();
        assert_eq!(loaded.site.site_url, "https://etsin.example.org");
        assert_eq!(loaded.site.admin_emails, cfg.site.admin_emails);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider]\nbatch_size = 7\n").unwrap();

        let loaded = HarvestConfig::load_from(&path).unwrap();
        assert_eq!(loaded.provider.batch_size, 7);
        assert_eq!(loaded.site.site_title, "repository");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = HarvestConfig::load_from(Path::new("/tmp/nonexistent_oaiharvest_config.toml")).unwrap();
        assert_eq!(cfg.site.site_url, "http://localhost:5000");
    }

    #[test]
    fn test_database_path() {
        let cfg = HarvestConfig::default();
        assert!(cfg.database_path().to_string_lossy().ends_with("catalog.db"));
    }
}
