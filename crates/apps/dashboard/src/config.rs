use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::FixedOffset;
use clap::Parser;
use formats::station::Variable;
use foundation::time::offset_from_hours;
use layers::cluster::ClusterConfig;
use layers::ToggleState;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Live weather-station and wildfire map dashboard")]
pub struct Args {
    /// Station feed endpoint returning `{ geojson, last_update }`
    #[arg(long, env = "METEOMAP_STATIONS_URL", default_value = "http://127.0.0.1:8080/stations")]
    pub stations_url: String,

    /// FIRMS hotspot feed endpoint returning `{ geojson, last_update }`
    #[arg(long, env = "METEOMAP_FIRMS_URL", default_value = "http://127.0.0.1:8080/firms")]
    pub firms_url: String,

    /// Address for the dashboard HTTP API
    #[arg(long, env = "METEOMAP_ADDR", default_value = "127.0.0.1:9200")]
    pub addr: SocketAddr,

    /// Seconds between refreshes of each feed
    #[arg(long, env = "METEOMAP_REFRESH_SECS", default_value_t = 300)]
    pub refresh_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "METEOMAP_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Variable driving station colors at startup
    #[arg(long, env = "METEOMAP_VARIABLE", default_value = "temperature")]
    pub variable: Variable,

    /// Fixed UTC offset for the "last updated" label
    #[arg(long, env = "METEOMAP_UTC_OFFSET_HOURS", default_value_t = -3, allow_hyphen_values = true)]
    pub utc_offset_hours: i32,

    /// Start with the rainfall footprint checked
    #[arg(long)]
    pub rainfall: bool,

    /// Start with the humidity footprint checked
    #[arg(long)]
    pub humidity: bool,

    /// Start with fire hotspots checked
    #[arg(long)]
    pub fires: bool,

    /// Screen radius within which station markers merge into a cluster
    #[arg(long, env = "METEOMAP_CLUSTER_RADIUS_PX", default_value_t = 80.0)]
    pub cluster_radius_px: f64,

    /// Zoom level at which clustering turns off
    #[arg(long, env = "METEOMAP_DISABLE_CLUSTERING_AT_ZOOM", default_value_t = 8.0)]
    pub disable_clustering_at_zoom: f64,

    /// Run without overlay toggle controls (every overlay stays off)
    #[arg(long, conflicts_with_all = ["rainfall", "humidity", "fires"])]
    pub no_controls: bool,
}

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub stations_url: String,
    pub firms_url: String,
    pub addr: SocketAddr,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub variable: Variable,
    pub display_offset: FixedOffset,
    pub toggles: ToggleState,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyUrl(&'static str),
    ZeroDuration(&'static str),
    BadOffset(i32),
    BadCluster(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyUrl(name) => write!(f, "--{name} must not be empty"),
            ConfigError::ZeroDuration(name) => write!(f, "--{name} must be greater than zero"),
            ConfigError::BadOffset(hours) => {
                write!(f, "--utc-offset-hours {hours} is outside -23..=23")
            }
            ConfigError::BadCluster(name) => {
                write!(f, "--{name} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Args {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        if self.stations_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("stations-url"));
        }
        if self.firms_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("firms-url"));
        }
        if self.refresh_secs == 0 {
            return Err(ConfigError::ZeroDuration("refresh-secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request-timeout-secs"));
        }
        let display_offset = offset_from_hours(self.utc_offset_hours)
            .ok_or(ConfigError::BadOffset(self.utc_offset_hours))?;

        for (name, value) in [
            ("cluster-radius-px", self.cluster_radius_px),
            ("disable-clustering-at-zoom", self.disable_clustering_at_zoom),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::BadCluster(name));
            }
        }

        let toggles = if self.no_controls {
            ToggleState::default()
        } else {
            ToggleState::with_controls(self.rainfall, self.humidity, self.fires)
        };

        Ok(Config {
            stations_url: self.stations_url.trim().to_string(),
            firms_url: self.firms_url.trim().to_string(),
            addr: self.addr,
            refresh_interval: Duration::from_secs(self.refresh_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            variable: self.variable,
            display_offset,
            toggles,
            cluster: ClusterConfig {
                max_cluster_radius_px: self.cluster_radius_px,
                disable_clustering_at_zoom: self.disable_clustering_at_zoom,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, ConfigError};
    use clap::Parser;
    use formats::station::Variable;
    use layers::ToggleState;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("meteomap").chain(args.iter().copied()))
            .expect("args")
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = parse(&[]).into_config().expect("config");
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:9200");
        assert_eq!(cfg.refresh_interval.as_secs(), 300);
        assert_eq!(cfg.variable, Variable::Temperature);
        assert_eq!(cfg.display_offset.local_minus_utc(), -3 * 3600);
        assert_eq!(cfg.toggles, ToggleState::with_controls(false, false, false));
        assert_eq!(cfg.cluster.max_cluster_radius_px, 80.0);
        assert_eq!(cfg.cluster.disable_clustering_at_zoom, 8.0);
    }

    #[test]
    fn accepts_feed_keys_and_flags() {
        let cfg = parse(&["--variable", "aguaCaida24Horas", "--rainfall", "--fires"])
            .into_config()
            .expect("config");
        assert_eq!(cfg.variable, Variable::Precipitation24h);
        assert_eq!(cfg.toggles, ToggleState::with_controls(true, false, true));

        let cfg = parse(&["--no-controls"]).into_config().expect("config");
        assert_eq!(cfg.toggles, ToggleState::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Args::try_parse_from(["meteomap", "--variable", "pressure"]).is_err());
        assert_eq!(
            parse(&["--refresh-secs", "0"]).into_config().err(),
            Some(ConfigError::ZeroDuration("refresh-secs"))
        );
        assert_eq!(
            parse(&["--utc-offset-hours", "30"]).into_config().err(),
            Some(ConfigError::BadOffset(30))
        );
        assert!(parse(&["--utc-offset-hours", "-4"]).into_config().is_ok());
        assert_eq!(
            parse(&["--cluster-radius-px=-1"]).into_config().err(),
            Some(ConfigError::BadCluster("cluster-radius-px"))
        );
    }
}
