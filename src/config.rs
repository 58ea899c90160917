//! Vault configuration
//!
//! Loaded once per run from YAML and passed explicitly to the walker and the
//! runners. Resolution priority for the file:
//! 1. `--config <PATH>`
//! 2. `$PAPERNOTE_CONFIG`
//! 3. `<config dir>/papernote/config.yaml`
//!
//! `--vault` and `$PAPERNOTE_VAULT` override the `vault` entry.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants as C;
use crate::error::{Error, Result};
use crate::walker::{EnumerateOptions, KindFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the vault
    pub vault: PathBuf,
    /// Subpaths skipped during enumeration, relative to the vault
    pub exclude: Vec<PathBuf>,
    pub extension: String,
    pub kind_property: String,
    pub kind_markers: Vec<String>,
    pub citation_key_property: String,
    /// CSL-JSON export of the reference manager library
    pub bibliography: Option<PathBuf>,
    pub better_bibtex_url: String,
    /// Upper bound on concurrent lookups
    pub workers: usize,
    /// Full journal name to abbreviation
    pub journal_abbreviations: BTreeMap<String, String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        let kind = KindFilter::default();
        Self {
            vault: PathBuf::new(),
            exclude: Vec::new(),
            extension: C::DEFAULT_EXTENSION.to_string(),
            kind_property: kind.property,
            kind_markers: kind.markers,
            citation_key_property: C::DEFAULT_CITATION_KEY_PROPERTY.to_string(),
            bibliography: None,
            better_bibtex_url: C::DEFAULT_BETTER_BIBTEX_URL.to_string(),
            workers: C::DEFAULT_WORKERS,
            journal_abbreviations: BTreeMap::new(),
        }
    }
}

/// Default config file location under the user config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(C::CONFIG_DIR_NAME).join(C::CONFIG_FILENAME))
}

impl VaultConfig {
    /// Config for a vault with every other setting at its default
    pub fn for_vault(vault: impl Into<PathBuf>) -> Self {
        Self {
            vault: vault.into(),
            ..Default::default()
        }
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        let config: VaultConfig = serde_yaml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the config from flags, environment and the default location
    pub fn resolve(config_flag: Option<&Path>, vault_flag: Option<&Path>) -> Result<Self> {
        Self::resolve_with(config_flag, vault_flag, default_config_path(), |name| {
            std::env::var(name).ok()
        })
    }

    fn resolve_with<E>(
        config_flag: Option<&Path>,
        vault_flag: Option<&Path>,
        default_path: Option<PathBuf>,
        env: E,
    ) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        // Treat empty strings as unset
        let env = |name: &str| env(name).filter(|s| !s.is_empty());

        // Step 1: locate the file; an explicit path has to exist
        let mut config = if let Some(path) = config_flag {
            Self::load(path)?
        } else if let Some(path) = env(C::ENV_CONFIG) {
            Self::load(Path::new(&path))?
        } else {
            match default_path {
                Some(path) if path.is_file() => Self::load(&path)?,
                _ => Self::default(),
            }
        };

        // Step 2: vault overrides
        if let Some(vault) = vault_flag {
            config.vault = vault.to_path_buf();
        } else if let Some(vault) = env(C::ENV_VAULT) {
            config.vault = PathBuf::from(vault);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.vault.as_os_str().is_empty() {
            return Err(Error::Config(format!(
                "no vault configured; pass --vault, set ${} or add 'vault' to the config file",
                C::ENV_VAULT
            )));
        }
        if self.workers == 0 {
            return Err(Error::Config("'workers' must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn kind(&self) -> KindFilter {
        KindFilter {
            property: self.kind_property.clone(),
            markers: self.kind_markers.clone(),
        }
    }

    pub fn enumerate_options(&self) -> EnumerateOptions {
        EnumerateOptions {
            extension: self.extension.clone(),
            exclude: self.exclude.clone(),
            ..Default::default()
        }
    }

    /// Bibliography file, relative paths taken from the vault root
    pub fn bibliography_path(&self) -> Option<PathBuf> {
        self.bibliography.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.vault.join(p)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            "c.yaml",
            "vault: /notes\nexclude:\n  - templates\njournal_abbreviations:\n  Journal of Things: J. Things\n",
        );
        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.vault, PathBuf::from("/notes"));
        assert_eq!(config.exclude, vec![PathBuf::from("templates")]);
        assert_eq!(config.extension, "md");
        assert_eq!(config.workers, 8);
        assert_eq!(config.kind(), KindFilter::default());
        assert_eq!(
            config.journal_abbreviations.get("Journal of Things").map(String::as_str),
            Some("J. Things")
        );
    }

    #[test]
    fn test_priority_flag_then_env_then_default() {
        let temp_dir = TempDir::new().unwrap();
        let flag = write_config(&temp_dir, "flag.yaml", "vault: /from-flag\n");
        let env = write_config(&temp_dir, "env.yaml", "vault: /from-env\n");
        let default = write_config(&temp_dir, "default.yaml", "vault: /from-default\n");
        let env_path = env.to_string_lossy().to_string();
        let vars = [(C::ENV_CONFIG, env_path.as_str())];

        let c = VaultConfig::resolve_with(Some(&flag), None, Some(default.clone()), env_of(&vars)).unwrap();
        assert_eq!(c.vault, PathBuf::from("/from-flag"));

        let c = VaultConfig::resolve_with(None, None, Some(default.clone()), env_of(&vars)).unwrap();
        assert_eq!(c.vault, PathBuf::from("/from-env"));

        let c = VaultConfig::resolve_with(None, None, Some(default), env_of(&[])).unwrap();
        assert_eq!(c.vault, PathBuf::from("/from-default"));
    }

    #[test]
    fn test_vault_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_config(&temp_dir, "c.yaml", "vault: /from-file\nworkers: 2\n");

        let vars = [(C::ENV_VAULT, "/from-env")];
        let c = VaultConfig::resolve_with(Some(&file), None, None, env_of(&vars)).unwrap();
        assert_eq!(c.vault, PathBuf::from("/from-env"));
        assert_eq!(c.workers, 2);

        let c = VaultConfig::resolve_with(Some(&file), Some(Path::new("/flag")), None, env_of(&vars)).unwrap();
        assert_eq!(c.vault, PathBuf::from("/flag"));
    }

    #[test]
    fn test_missing_default_file_is_allowed_with_vault() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("none.yaml");
        let c = VaultConfig::resolve_with(None, Some(Path::new("/v")), Some(missing), env_of(&[])).unwrap();
        assert_eq!(c, VaultConfig::for_vault("/v"));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("none.yaml");
        let result = VaultConfig::resolve_with(Some(&missing), Some(Path::new("/v")), None, env_of(&[]));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_no_vault_is_a_config_error() {
        let result = VaultConfig::resolve_with(None, None, None, env_of(&[(C::ENV_VAULT, "")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bibliography_path_relative_to_vault() {
        let mut config = VaultConfig::for_vault("/notes");
        assert_eq!(config.bibliography_path(), None);
        config.bibliography = Some(PathBuf::from("library.json"));
        assert_eq!(config.bibliography_path(), Some(PathBuf::from("/notes/library.json")));
    }
}
