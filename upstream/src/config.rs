use serde::Deserialize;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.instantly.ai/";

/// Analytics provider connection settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Origin of the provider API. Endpoint paths are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token sent with every request. Usually injected from the environment.
    #[serde(default)]
    pub api_key: String,
    /// Timeout for a single request attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on 429 and 5xx responses, on top of the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("api_key: secret").unwrap();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_invalid_url() {
        assert!(serde_yaml::from_str::<Config>("base_url: not-a-url").is_err());
    }
}
