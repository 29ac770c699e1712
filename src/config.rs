use crate::error::ConfigError;
use crate::gallery::ImageMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Catalog document opened when nothing else is configured.
pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1my6VbCaAlDjVm5ITvjSV94tVU8AfR8zrHuEtKhjCAhY/edit?usp=sharing";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Runtime settings.
///
/// Built from defaults, then an optional JSON file, then `CATALOG_*`
/// environment variables; each source overrides the previous one.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sheet_url: String,
    pub bind: String,
    pub access_token: Option<String>,
    /// JSON file holding `{"access_token": "..."}`.
    pub credentials: Option<PathBuf>,
    pub image_mode: ImageMode,
    /// Seed file for the in-memory store; replaces the remote service.
    pub demo_data: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Credentials {
    access_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            access_token: None,
            credentials: None,
            image_mode: ImageMode::Link,
            demo_data: None,
        }
    }
}

impl Config {
    /// Defaults, overridden by `file` if given, then by the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = read(path)?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CATALOG_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("CATALOG_SHEET_URL") {
            self.sheet_url = url;
        }
        if let Some(bind) = lookup("CATALOG_BIND") {
            self.bind = bind;
        }
        if let Some(token) = lookup("CATALOG_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(path) = lookup("CATALOG_CREDENTIALS") {
            self.credentials = Some(PathBuf::from(path));
        }
        if let Some(mode) = lookup("CATALOG_IMAGE_MODE") {
            self.image_mode = mode.parse()?;
        }
        if let Some(path) = lookup("CATALOG_DEMO_DATA") {
            self.demo_data = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// The bearer token for the spreadsheet service.
    ///
    /// An explicit token wins over the credentials file.
    pub fn access_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = self.access_token.as_ref().filter(|t| !t.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }

        let path = self
            .credentials
            .as_ref()
            .ok_or(ConfigError::MissingAccessToken)?;
        let credentials: Credentials =
            serde_json::from_str(&read(path)?).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(credentials.access_token)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn env_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            ("CATALOG_BIND", "0.0.0.0:8080"),
            ("CATALOG_IMAGE_MODE", "inline"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.image_mode, ImageMode::Inline);
        assert_eq!(config.sheet_url, DEFAULT_SHEET_URL);
    }

    #[test]
    fn bad_image_mode_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "CATALOG_IMAGE_MODE").then(|| "thumbnail".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidImageMode(mode) if mode == "thumbnail"));
    }

    #[test]
    fn file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bind": "127.0.0.1:9000", "image_mode": "inline"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.image_mode, ImageMode::Inline);
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn token_comes_from_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"access_token": "ya29.abc"}}"#).unwrap();

        let config = Config {
            credentials: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(config.access_token().unwrap(), "ya29.abc");

        let explicit = Config {
            access_token: Some("direct".to_string()),
            ..config
        };
        assert_eq!(explicit.access_token().unwrap(), "direct");
    }

    #[test]
    fn missing_token_fails() {
        assert!(matches!(
            Config::default().access_token(),
            Err(ConfigError::MissingAccessToken)
        ));
    }
}
