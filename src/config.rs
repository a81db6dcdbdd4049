use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TOKEN: &str = "faketoken";

/// Runtime configuration for the console. The client keeps no files of its
/// own, so everything comes from the environment with development defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub bearer_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("VXML_CONSOLE_API_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let bearer_token = env::var("VXML_CONSOLE_API_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: DEFAULT_TOKEN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        env::set_var("VXML_CONSOLE_API_URL", "http://api.example.com/");
        let config = AppConfig::from_env();
        assert_eq!(config.base_url, "http://api.example.com");
        env::remove_var("VXML_CONSOLE_API_URL");
    }

    #[test]
    fn empty_vars_fall_back_to_defaults() {
        env::set_var("VXML_CONSOLE_API_TOKEN", "");
        let config = AppConfig::from_env();
        assert_eq!(config.bearer_token, DEFAULT_TOKEN);
        env::remove_var("VXML_CONSOLE_API_TOKEN");
    }
}
