use std::path::PathBuf;

const DEFAULT_LOG_FILTER: &str = "rosterd=info";

/// Process settings read from the environment.
///
/// | Variable            | Default         | Meaning                                   |
/// |---------------------|-----------------|-------------------------------------------|
/// | `ROSTERD_WORKSPACE` | none            | workspace opened at startup               |
/// | `ROSTERD_LOG`       | `RUST_LOG`, then `rosterd=info` | tracing filter directives |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Config {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Config {
            workspace: non_empty("ROSTERD_WORKSPACE").map(PathBuf::from),
            log_filter: non_empty("ROSTERD_LOG")
                .or_else(|| non_empty("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
