use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

use crate::error::{Result, TodoError};
use crate::overlay::FailurePolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub per_page: Option<u32>,
    pub search_debounce_ms: Option<u64>,
    pub rollback_on_failure: Option<bool>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| TodoError::ConfigRead {
                path: config_path.clone(),
                source: e,
            })?;

        Self::parse(&contents).map_err(|e| TodoError::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "todo")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(TodoError::NoConfigDir)
    }

    /// Resolve the backend URL: explicit flag, then `TODO_API_URL`, then config, then default.
    pub fn base_url(&self, explicit: Option<&str>) -> Result<Url> {
        let env = std::env::var("TODO_API_URL").ok();
        let raw = explicit
            .map(String::from)
            .or(env)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        parse_base_url(&raw)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.filter(|n| *n > 0).unwrap_or(DEFAULT_PER_PAGE)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(
            self.search_debounce_ms
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS),
        )
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.rollback_on_failure.unwrap_or(false) {
            FailurePolicy::Rollback
        } else {
            FailurePolicy::Keep
        }
    }
}

/// Parse a base URL into its canonical form ending in `/`. The client appends resource
/// path segments after it, so a prefix like `/api` is kept.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| TodoError::InvalidUrl(format!("{raw}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(TodoError::InvalidUrl(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.failure_policy(), FailurePolicy::Keep);
    }

    #[test]
    fn test_parse_all_keys() {
        let config = Config::parse(
            r#"
base_url = "http://example.test:4000/api"
per_page = 5
search_debounce_ms = 50
rollback_on_failure = true
"#,
        )
        .unwrap();

        assert_eq!(config.per_page(), 5);
        assert_eq!(config.search_debounce(), Duration::from_millis(50));
        assert_eq!(config.failure_policy(), FailurePolicy::Rollback);
        let url = config.base_url(Some("http://flag.test")).unwrap();
        assert_eq!(url.as_str(), "http://flag.test/");
    }

    #[test]
    fn test_zero_per_page_falls_back() {
        let config = Config::parse("per_page = 0").unwrap();
        assert_eq!(config.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("http://localhost:3001/api").unwrap();
        assert_eq!(url.join("users").unwrap().as_str(), "http://localhost:3001/api/users");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(TodoError::InvalidUrl(_))
        ));
        assert!(parse_base_url("mailto:someone@example.com").is_err());
    }
}
