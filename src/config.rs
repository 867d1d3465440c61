use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://thesimpsonsapi.com/api";
pub const DEFAULT_CDN_BASE: &str = "https://cdn.thesimpsonsapi.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub cdn_base: String,
    /// Directory image archives are written to; the working directory
    /// when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            export_dir: None,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("cromulent").join("config.toml"))
}

impl Config {
    /// Load the config file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        toml::from_str(&content).unwrap_or_default()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
api_base = "http://localhost:8080/api"
cdn_base = "http://localhost:8080/cdn"
export_dir = "/tmp/simpsons"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_base, "http://localhost:8080/api");
        assert_eq!(config.cdn_base, "http://localhost:8080/cdn");
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/simpsons"));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str(r#"api_base = "http://localhost/api""#).unwrap();
        assert_eq!(config.api_base, "http://localhost/api");
        assert_eq!(config.cdn_base, DEFAULT_CDN_BASE);
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.export_dir.is_none());
    }
}
