use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use serde::Deserialize;

use crate::metrics_defs::{MetricDef, describe};

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

/// Installs a StatsD recorder as the global metrics recorder and describes
/// every metric in `defs`.
///
/// Without a config the metrics facade stays a no-op.
pub fn init(
    config: Option<&MetricsConfig>,
    prefix: &str,
    defs: &[&[MetricDef]],
) -> Result<(), MetricsError> {
    let Some(config) = config else {
        tracing::debug!("no metrics config, metrics are discarded");
        return Ok(());
    };

    let recorder =
        StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port).build(Some(prefix))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::RecorderAlreadySet)?;

    for group in defs {
        describe(group);
    }

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        prefix,
        "sending metrics to statsd"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metrics_config() {
        let config: MetricsConfig =
            serde_yaml::from_str("{statsd_host: 127.0.0.1, statsd_port: 8125}").unwrap();
        assert_eq!(config.statsd_host, "127.0.0.1");
        assert_eq!(config.statsd_port, 8125);

        assert!(serde_yaml::from_str::<MetricsConfig>("{statsd_host: 127.0.0.1}").is_err());
    }

    #[test]
    fn test_init_without_config() {
        assert!(init(None, "grouping", &[]).is_ok());
    }
}
