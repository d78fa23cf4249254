use crowdsolve_errors::AppError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_SESSION_DIR: &str = ".crowdsolve";
const DEFAULT_TIMEOUT_SECS: &str = "15";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub session_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let timeout_secs: u64 = try_load(&lookup, "CROWDSOLVE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            base_url: try_load(&lookup, "CROWDSOLVE_BASE_URL", DEFAULT_BASE_URL)?,
            session_dir: try_load(&lookup, "CROWDSOLVE_SESSION_DIR", DEFAULT_SESSION_DIR)?,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid {key} value {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5000/api");
        assert_eq!(config.session_dir, PathBuf::from(".crowdsolve"));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CROWDSOLVE_BASE_URL", "https://crowdsolve.example/api"),
            ("CROWDSOLVE_TIMEOUT_SECS", " 3 "),
        ]))
        .unwrap();
        assert_eq!(config.base_url.host_str(), Some("crowdsolve.example"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = Config::from_lookup(lookup(&[("CROWDSOLVE_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup(&[("CROWDSOLVE_BASE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
