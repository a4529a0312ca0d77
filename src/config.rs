use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:9876/app";
const UI_SUFFIX: &str = "/app";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Location the console was pointed at, fragment included.
    pub page_url: Url,
    /// API root derived from `page_url`, without a trailing slash.
    pub api_base: String,
    pub token: Option<String>,
    pub refresh_interval: Duration,
    pub follow_interval: Duration,
    pub default_path: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let page_url = env::var("PMCONSOLE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE_URL.to_string());
        let token = env::var("PMCONSOLE_TOKEN").ok();
        let refresh_ms = env_u64("PMCONSOLE_REFRESH_MS", 5_000).clamp(500, 60_000);
        let default_path = env::var("PMCONSOLE_DEFAULT_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(default_working_dir);

        Self::from_parts(
            &page_url,
            token,
            Duration::from_millis(refresh_ms),
            default_path,
        )
    }

    pub fn from_parts(
        page_url: &str,
        token: Option<String>,
        refresh_interval: Duration,
        default_path: String,
    ) -> Result<Self> {
        let page_url = Url::parse(page_url.trim())
            .with_context(|| format!("invalid supervisor url: {page_url}"))?;
        let api_base = derive_api_base(&page_url);

        Ok(Self {
            page_url,
            api_base,
            token: token
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            refresh_interval,
            follow_interval: Duration::from_secs(2),
            default_path,
        })
    }

    /// Re-targets the config, e.g. from `--url`.
    pub fn with_page_url(self, page_url: &str) -> Result<Self> {
        Self::from_parts(
            page_url,
            self.token,
            self.refresh_interval,
            self.default_path,
        )
    }

    pub fn with_token(mut self, token: String) -> Self {
        let token = token.trim().to_string();
        self.token = (!token.is_empty()).then_some(token);
        self
    }
}

/// Strips query, fragment, trailing slashes and the UI mount suffix.
pub fn derive_api_base(page_url: &Url) -> String {
    let mut base = page_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let path = base.path().trim_end_matches('/');
    let path = path.strip_suffix(UI_SUFFIX).unwrap_or(path).to_string();
    base.set_path(&path);

    base.as_str().trim_end_matches('/').to_string()
}

fn default_working_dir() -> String {
    env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "/tmp".to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use url::Url;

    use super::{derive_api_base, env_u64, AppConfig, DEFAULT_PAGE_URL};

    fn base_of(page: &str) -> String {
        derive_api_base(&Url::parse(page).expect("valid url"))
    }

    #[test]
    fn api_base_strips_trailing_slash_and_ui_suffix() {
        assert_eq!(base_of("http://127.0.0.1:9876/app"), "http://127.0.0.1:9876");
        assert_eq!(base_of("http://127.0.0.1:9876/app/"), "http://127.0.0.1:9876");
        assert_eq!(base_of("http://host/opm/app#3"), "http://host/opm");
        assert_eq!(base_of("http://host/opm/"), "http://host/opm");
        assert_eq!(base_of("http://host/"), "http://host");
        assert_eq!(base_of("https://host/apps?x=1"), "https://host/apps");
    }

    #[test]
    fn from_parts_keeps_fragment_on_page_url_and_drops_blank_token() {
        let config = AppConfig::from_parts(
            "http://host:9876/app#42",
            Some("  ".to_string()),
            Duration::from_secs(5),
            "/tmp".to_string(),
        )
        .expect("expected config to build");

        assert_eq!(config.page_url.fragment(), Some("42"));
        assert_eq!(config.api_base, "http://host:9876");
        assert_eq!(config.token, None);
        assert_eq!(config.follow_interval, Duration::from_secs(2));
    }

    #[test]
    fn from_parts_rejects_invalid_url() {
        let err = AppConfig::from_parts(
            "not a url",
            None,
            Duration::from_secs(5),
            "/tmp".to_string(),
        )
        .expect_err("expected invalid url to fail");
        assert!(err.to_string().contains("invalid supervisor url"));
    }

    #[test]
    fn overrides_replace_url_and_token() {
        let config = AppConfig::from_parts(
            DEFAULT_PAGE_URL,
            None,
            Duration::from_secs(5),
            "/srv".to_string(),
        )
        .expect("expected config to build")
        .with_page_url("http://10.0.0.2:8080/pm/app/")
        .expect("expected override to parse")
        .with_token("secret".to_string());

        assert_eq!(config.api_base, "http://10.0.0.2:8080/pm");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.default_path, "/srv");
    }

    #[test]
    fn load_reads_environment() {
        let _guard = env_lock().lock().expect("failed to acquire env lock");
        let old_url = std::env::var("PMCONSOLE_URL").ok();
        let old_refresh = std::env::var("PMCONSOLE_REFRESH_MS").ok();
        let old_path = std::env::var("PMCONSOLE_DEFAULT_PATH").ok();

        std::env::set_var("PMCONSOLE_URL", "http://example.test/ui/app");
        std::env::set_var("PMCONSOLE_REFRESH_MS", "10");
        std::env::set_var("PMCONSOLE_DEFAULT_PATH", "/var/apps");

        let config = AppConfig::load().expect("expected config load to succeed");
        assert_eq!(config.api_base, "http://example.test/ui");
        assert_eq!(config.refresh_interval, Duration::from_millis(500));
        assert_eq!(config.default_path, "/var/apps");

        restore_env("PMCONSOLE_URL", old_url);
        restore_env("PMCONSOLE_REFRESH_MS", old_refresh);
        restore_env("PMCONSOLE_DEFAULT_PATH", old_path);
    }

    #[test]
    fn env_u64_uses_default_for_invalid_values() {
        let _guard = env_lock().lock().expect("failed to acquire env lock");
        let old = std::env::var("PMCONSOLE_TEST_ENV_U64").ok();
        std::env::set_var("PMCONSOLE_TEST_ENV_U64", "soon");

        assert_eq!(env_u64("PMCONSOLE_TEST_ENV_U64", 42), 42);

        restore_env("PMCONSOLE_TEST_ENV_U64", old);
    }

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn restore_env(key: &str, previous: Option<String>) {
        if let Some(value) = previous {
            std::env::set_var(key, value);
        } else {
            std::env::remove_var(key);
        }
    }
}
