/*
[INPUT]:  Defaults, YAML configuration file, KLINE_CHART__* environment
[OUTPUT]: Layered AppConfig for the feed, chart, page and logging
[POS]:    Configuration layer - application setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use ::config::{Config, Environment, File, Map};
use kline_feed::FeedConfig;
use serde::{Deserialize, Serialize};

use crate::chart::ChartOptions;

const ENV_PREFIX: &str = "KLINE_CHART";
const ENV_SEPARATOR: &str = "__";
const APP_DIR: &str = "kline-chart";
const CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Feed connection
    #[serde(default)]
    pub feed: FeedConfig,
    /// Chart appearance
    #[serde(default)]
    pub chart: ChartOptions,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageConfig {
    /// Heading shown above the status line
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// tracing filter directive, e.g. "info" or "kline_feed=debug,info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a daily rolling log file here
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file, then `KLINE_CHART__*` environment variables.
    ///
    /// With no explicit path the per-user config file is used when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load a single YAML file on top of the defaults, ignoring the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load_with_env(Some(path), Some(Map::new()))
    }

    fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("failed to build default configuration")?;
        let mut builder = Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("config file not found: {}", path.display()));
                }
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("feed.transports")
                .source(env),
        );

        let config: AppConfig = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// `<config dir>/kline-chart/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<()> {
        self.feed
            .validate()
            .context("invalid feed configuration")?;
        self.chart
            .validate()
            .map_err(|err| anyhow!(err))
            .context("invalid chart configuration")?;
        if self.log.level.trim().is_empty() {
            return Err(anyhow!("log.level must not be empty"));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize config to YAML")
    }
}

fn default_title() -> String {
    "BTC/USDC Market Data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "kline-chart.log".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kline_feed::TransportKind;
    use std::io::Write;

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.feed.url, "http://localhost:5000");
        assert_eq!(config.page.title, "BTC/USDC Market Data");
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = yaml_file(
            "feed:\n  url: http://10.1.2.3:5000\n  transports: [polling]\nchart:\n  height: 30\npage:\n  title: ETH\n",
        );
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.feed.url, "http://10.1.2.3:5000");
        assert_eq!(config.feed.transports, vec![TransportKind::Polling]);
        assert_eq!(config.feed.event, "kline_data");
        assert_eq!(config.chart.height, 30);
        assert_eq!(config.chart.series.line_color, "#2962FF");
        assert_eq!(config.page.title, "ETH");
    }

    #[test]
    fn environment_overrides_file() {
        let file = yaml_file("feed:\n  url: http://10.1.2.3:5000\n");
        let mut env = Map::new();
        env.insert(
            "KLINE_CHART__FEED__URL".to_string(),
            "https://feed.example.com".to_string(),
        );
        env.insert(
            "KLINE_CHART__FEED__TRANSPORTS".to_string(),
            "polling,websocket".to_string(),
        );
        env.insert(
            "KLINE_CHART__FEED__RECONNECTION_ATTEMPTS".to_string(),
            "2".to_string(),
        );

        let config = AppConfig::load_with_env(Some(file.path()), Some(env)).unwrap();
        assert_eq!(config.feed.url, "https://feed.example.com");
        assert_eq!(
            config.feed.transports,
            vec![TransportKind::Polling, TransportKind::Websocket]
        );
        assert_eq!(config.feed.reconnection_attempts, 2);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = AppConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn yaml_round_trip_keeps_values() {
        let mut config = AppConfig::default();
        config.log.directory = Some(PathBuf::from("/var/log/kline-chart"));
        config.chart.width = Some(100);

        let yaml = config.to_yaml().unwrap();
        let file = yaml_file(&yaml);
        assert_eq!(AppConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn validate_reports_bad_sections() {
        let mut config = AppConfig::default();
        config.feed.url = "ftp://nowhere".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.chart.height = 0;
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("chart.height"));
    }
}
