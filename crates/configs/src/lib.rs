use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_CONFIG_PATH: &str = "banner.toml";
/// Mirrors `service::banner::DEFAULT_NAMESPACE`; configs sits below service and cannot import it.
pub const DEFAULT_NAMESPACE: &str = "GlobalMessageBanners";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which settings store adapter the CLI talks to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub default_utc_offset_minutes: i32,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            organization: String::new(),
            token: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
            namespace: default_namespace(),
            file_path: default_file_path(),
            default_utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_api_version() -> String { "5.0-preview.1".into() }
fn default_timeout() -> u64 { 30 }
fn default_namespace() -> String { DEFAULT_NAMESPACE.into() }
fn default_file_path() -> String { "data/settings.json".into() }
fn default_log_format() -> String { "compact".into() }

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Load from `CONFIG_PATH`, falling back to `banner.toml`. A missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_optional(&path)
}

pub fn load_optional(path: &str) -> Result<AppConfig> {
    if std::path::Path::new(path).exists() {
        load_from_file(path)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read config {path}: {e}"))?;
    let cfg: AppConfig = toml::from_str(&content)
        .map_err(|e| anyhow!("invalid config {path}: {e}"))?;
    Ok(cfg)
}

impl AppConfig {
    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 组织地址与令牌允许从环境变量补齐
        self.settings.normalize_from_env();
        self.settings.normalize();
        self.settings.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl SettingsConfig {
    pub fn normalize_from_env(&mut self) {
        if self.organization.trim().is_empty() {
            if let Ok(org) = std::env::var("BANNER_ORG") {
                self.organization = org;
            }
        }
        if self.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.token = std::env::var("BANNER_PAT").ok().filter(|t| !t.trim().is_empty());
        }
    }

    fn normalize(&mut self) {
        let org = self.organization.trim().trim_end_matches('/');
        self.organization = org.to_string();
        self.namespace = self.namespace.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::Http {
            if self.organization.is_empty() {
                return Err(anyhow!(
                    "settings.organization is empty; set it in the config file, BANNER_ORG, or --org"
                ));
            }
            let lower = self.organization.to_lowercase();
            if !(lower.starts_with("https://") || lower.starts_with("http://")) {
                return Err(anyhow!("settings.organization must start with http:// or https://"));
            }
            if self.api_version.trim().is_empty() {
                return Err(anyhow!("settings.api_version must not be empty"));
            }
        }
        if self.backend == Backend::File && self.file_path.trim().is_empty() {
            return Err(anyhow!("settings.file_path must not be empty for the file backend"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("settings.timeout_secs must be a positive number of seconds"));
        }
        if self.namespace.is_empty() || self.namespace.starts_with('/') || self.namespace.ends_with('/') {
            return Err(anyhow!("settings.namespace must be non-empty without leading or trailing '/'"));
        }
        if self.default_utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(anyhow!("settings.default_utc_offset_minutes must be within +-{MAX_OFFSET_MINUTES}"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        match self.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be \"compact\" or \"json\", got {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_settings(org: &str) -> SettingsConfig {
        SettingsConfig { organization: org.into(), ..SettingsConfig::default() }
    }

    #[test]
    fn defaults_are_sensible() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.settings.backend, Backend::Http);
        assert_eq!(cfg.settings.namespace, "GlobalMessageBanners");
        assert_eq!(cfg.settings.api_version, "5.0-preview.1");
        assert_eq!(cfg.settings.timeout_secs, 30);
        assert_eq!(cfg.logging.format, "compact");
    }

    #[test]
    fn parses_partial_toml() -> Result<()> {
        let cfg: AppConfig = toml::from_str(
            r#"
            [settings]
            backend = "file"
            file_path = "/tmp/s.json"
            namespace = "TestBanners"
            "#,
        )?;
        assert_eq!(cfg.settings.backend, Backend::File);
        assert_eq!(cfg.settings.file_path, "/tmp/s.json");
        assert_eq!(cfg.settings.namespace, "TestBanners");
        assert_eq!(cfg.settings.timeout_secs, 30);
        cfg.settings.validate()?;
        Ok(())
    }

    #[test]
    fn organization_trailing_slash_is_trimmed() -> Result<()> {
        let mut s = http_settings(" https://dev.example.com/acme/ ");
        s.normalize();
        assert_eq!(s.organization, "https://dev.example.com/acme");
        s.validate()?;
        Ok(())
    }

    #[test]
    fn http_backend_requires_url_scheme() {
        let mut s = http_settings("dev.example.com/acme");
        s.normalize();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_bad_namespace_and_timeout() {
        let mut s = http_settings("https://dev.example.com/acme");
        s.namespace = "Banners/".into();
        assert!(s.validate().is_err());

        let mut s = http_settings("https://dev.example.com/acme");
        s.timeout_secs = 0;
        assert!(s.validate().is_err());

        let mut s = http_settings("https://dev.example.com/acme");
        s.default_utc_offset_minutes = 15 * 60;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let l = LoggingConfig { format: "pretty".into() };
        assert!(l.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let path = std::env::temp_dir().join(format!("banner_cfg_{}.toml", uuid::Uuid::new_v4()));
        let cfg = load_optional(&path.to_string_lossy())?;
        assert_eq!(cfg.settings.namespace, DEFAULT_NAMESPACE);
        Ok(())
    }
}
