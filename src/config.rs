use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use thiserror::Error;

use crate::catalog::{Category, CatalogSource, ObjectOverride};

/// Environment variable that carries the live telemetry credential.
pub const TELEMETRY_API_KEY_ENV: &str = "ORBITWATCH_TELEMETRY_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub resolver: ResolverConfig,
    pub visibility: VisibilityConfig,
    pub footprint: FootprintConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub ttl: Duration,
    /// Minimum wait between refresh attempts after one has failed.
    #[serde(deserialize_with = "deserialize_duration")]
    pub retry_backoff: Duration,
    /// Fetch order doubles as priority order for duplicate catalog ids.
    pub sources: Vec<CatalogSource>,
    pub overrides: HashMap<String, ObjectOverride>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(90),
            retry_backoff: Duration::minutes(1),
            sources: default_sources(),
            overrides: HashMap::new(),
        }
    }
}

fn default_sources() -> Vec<CatalogSource> {
    [
        ("stations", Category::Station),
        ("weather", Category::Weather),
        ("gps-ops", Category::Navigation),
        ("galileo", Category::Navigation),
        ("geo", Category::Communication),
        ("resource", Category::EarthObservation),
        ("science", Category::Science),
    ]
    .into_iter()
    .map(|(group, category)| CatalogSource {
        name: group.to_string(),
        url: format!("https://celestrak.org/NORAD/elements/gp.php?GROUP={group}&FORMAT=tle"),
        category,
        timeout: default_source_timeout(),
    })
    .collect()
}

pub(crate) fn default_source_timeout() -> Duration {
    Duration::seconds(15)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub fast_cache_ttl: Duration,
    pub telemetry: TelemetryConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fast_cache_ttl: Duration::seconds(5),
            telemetry: TelemetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.n2yo.com/rest/v1/satellite".to_string(),
            api_key: None,
            timeout: Duration::seconds(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub min_elevation_deg: f64,
    #[serde(deserialize_with = "deserialize_duration")]
    pub step: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub lookback: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub lookahead: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub pass_cache_ttl: Duration,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: 10.0,
            step: Duration::seconds(60),
            lookback: Duration::hours(6),
            lookahead: Duration::hours(24),
            pass_cache_ttl: Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub segments: usize,
    pub partial_elevation_deg: f64,
    pub high_elevation_deg: f64,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cache_ttl: Duration,
    pub static_radii_deg: StaticRadii,
    pub styles: RingStyles,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            segments: 60,
            partial_elevation_deg: 25.0,
            high_elevation_deg: 50.0,
            cache_ttl: Duration::seconds(60),
            static_radii_deg: StaticRadii::default(),
            styles: RingStyles::default(),
        }
    }
}

/// Angular ring radii used when there is no orbit to derive them from.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StaticRadii {
    pub horizon: f64,
    pub partial: f64,
    pub high: f64,
}

impl Default for StaticRadii {
    fn default() -> Self {
        Self {
            horizon: 30.0,
            partial: 20.0,
            high: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingStyle {
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingStyles {
    pub horizon: RingStyle,
    pub partial: RingStyle,
    pub high: RingStyle,
}

impl Default for RingStyles {
    fn default() -> Self {
        let style = |color: &str, opacity| RingStyle {
            color: color.to_string(),
            opacity,
        };
        Self {
            horizon: style("#3b82f6", 0.15),
            partial: style("#22c55e", 0.25),
            high: style("#facc15", 0.35),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would break footprint nesting or stall the pass scan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let footprint = &self.footprint;
        let partial_el = footprint.partial_elevation_deg;
        let high_el = footprint.high_elevation_deg;
        if !(0.0 < partial_el && partial_el <= high_el && high_el < 90.0) {
            return Err(ConfigError::Invalid(format!(
                "footprint elevations must satisfy 0 < partial ({partial_el}) <= high ({high_el}) < 90"
            )));
        }

        let radii = footprint.static_radii_deg;
        let nested = 0.0 <= radii.high
            && radii.high <= radii.partial
            && radii.partial <= radii.horizon
            && radii.horizon <= 180.0;
        if !nested {
            return Err(ConfigError::Invalid(format!(
                "static radii must satisfy 0 <= high ({}) <= partial ({}) <= horizon ({}) <= 180",
                radii.high, radii.partial, radii.horizon
            )));
        }

        if footprint.segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "footprint.segments must be at least 3, got {}",
                footprint.segments
            )));
        }
        if self.visibility.step <= Duration::zero() {
            return Err(ConfigError::Invalid("visibility.step must be positive".to_string()));
        }
        Ok(())
    }

    /// Applies environment overrides on top of file values.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var(TELEMETRY_API_KEY_ENV) {
            let key = key.trim();
            if !key.is_empty() {
                self.resolver.telemetry.api_key = Some(key.to_string());
            }
        }
        self
    }
}

pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_documented_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.catalog.ttl, Duration::minutes(90));
        assert_eq!(config.catalog.retry_backoff, Duration::minutes(1));
        assert_eq!(config.resolver.fast_cache_ttl, Duration::seconds(5));
        assert_eq!(config.visibility.min_elevation_deg, 10.0);
        assert_eq!(config.visibility.step, Duration::seconds(60));
        assert_eq!(config.visibility.lookback, Duration::hours(6));
        assert_eq!(config.visibility.lookahead, Duration::hours(24));
        assert_eq!(config.footprint.segments, 60);
        assert_eq!(config.footprint.partial_elevation_deg, 25.0);
        assert_eq!(config.footprint.high_elevation_deg, 50.0);
        assert!(config.resolver.telemetry.api_key.is_none());
        assert_eq!(config.catalog.sources[0].name, "stations");
    }

    #[test]
    fn knobs_parse_human_readable_durations() {
        let yaml = r#"
catalog:
  ttl: 2h
  sources:
    - name: local
      url: http://localhost:9000/stations.txt
      category: station
      timeout: 3s
  overrides:
    "25544":
      name: ISS
      operator: NASA / Roscosmos
      mission_type: Crewed station
resolver:
  fast_cache_ttl: 2s
  telemetry:
    base_url: http://localhost:9001
    api_key: secret
visibility:
  min_elevation_deg: 5
  step: 30s
  lookback: 1h
  lookahead: 12h
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.catalog.ttl, Duration::hours(2));
        assert_eq!(config.catalog.sources.len(), 1);
        assert_eq!(config.catalog.sources[0].timeout, Duration::seconds(3));
        assert_eq!(config.catalog.sources[0].category, Category::Station);
        assert_eq!(
            config.catalog.overrides["25544"].operator.as_deref(),
            Some("NASA / Roscosmos")
        );
        assert_eq!(config.resolver.fast_cache_ttl, Duration::seconds(2));
        assert_eq!(config.resolver.telemetry.api_key.as_deref(), Some("secret"));
        assert_eq!(config.resolver.telemetry.timeout, Duration::seconds(5));
        assert_eq!(config.visibility.step, Duration::seconds(30));
        assert_eq!(config.visibility.pass_cache_ttl, Duration::minutes(10));
    }

    #[test]
    fn inverted_footprint_settings_are_rejected() {
        let radii = "footprint:\n  static_radii_deg:\n    horizon: 10\n    partial: 20\n    high: 30\n";
        assert!(matches!(Config::from_yaml(radii), Err(ConfigError::Invalid(_))));

        let elevations = "footprint:\n  partial_elevation_deg: 60\n  high_elevation_deg: 40\n";
        assert!(matches!(Config::from_yaml(elevations), Err(ConfigError::Invalid(_))));

        let step = "visibility:\n  step: 0s\n";
        assert!(matches!(Config::from_yaml(step), Err(ConfigError::Invalid(_))));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn malformed_duration_is_rejected() {
        let err = Config::from_yaml("catalog:\n  ttl: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
