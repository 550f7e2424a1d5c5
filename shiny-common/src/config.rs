//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "SHINY_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "shiny-admin.db";

/// Service configuration, read from `config.toml`.
///
/// Every key is optional in the file; missing keys take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root folder holding the database (overridden by CLI / env)
    pub root_folder: Option<PathBuf>,
    /// Explicit database path; defaults to `<root_folder>/shiny-admin.db`
    pub database: Option<PathBuf>,
    pub bind: String,
    pub port: u16,
    /// URL of the external analytical application embedded by the wrapper page
    pub shiny_app_url: String,
    /// Base URL used when logging password reset links
    pub public_base_url: String,
    pub session_cookie_name: String,
    pub session_ttl_seconds: i64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    pub password_reset_ttl_seconds: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database: None,
            bind: "127.0.0.1".to_string(),
            port: 8000,
            shiny_app_url: "/dams_mcda/".to_string(),
            public_base_url: "http://127.0.0.1:8000".to_string(),
            session_cookie_name: "sessionid".to_string(),
            // two weeks
            session_ttl_seconds: 1_209_600,
            secure_cookies: false,
            // three days
            password_reset_ttl_seconds: 259_200,
        }
    }
}

impl ServerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServerConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, or the platform default
    /// location when `path` is `None`. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_file() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.session_cookie_name.is_empty() {
            return Err(Error::Config("session_cookie_name must not be empty".to_string()));
        }
        if self.session_ttl_seconds <= 0 {
            return Err(Error::Config("session_ttl_seconds must be positive".to_string()));
        }
        if self.password_reset_ttl_seconds <= 0 {
            return Err(Error::Config(
                "password_reset_ttl_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Database path: explicit `database` key, else `<root>/shiny-admin.db`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE))
    }
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &ServerConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Default configuration file path for the platform
fn default_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/shiny-admin/config.toml first, then /etc/shiny-admin/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("shiny-admin").join("config.toml"));
        let system_config = PathBuf::from("/etc/shiny-admin/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("shiny-admin").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("shiny-admin"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/shiny-admin"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("shiny-admin"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/shiny-admin"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("shiny-admin"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\shiny-admin"))
    } else {
        PathBuf::from("./shiny_admin_data")
    }
}
