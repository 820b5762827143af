//! Runtime configuration for the dispatch services.

use std::time::Duration;

/// Tunables loaded from environment variables.
///
/// All fields have defaults suitable for local development; invalid
/// values fall back to the default with a warning rather than failing
/// startup, since the embedding application owns process lifecycle.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Timeout applied to every persistence-port call
    /// (default: 10 seconds).
    pub port_call_timeout: Duration,
    /// Whether `assign_order` notifies the driver when the caller does
    /// not say either way (default: `true`).
    pub notify_by_default: bool,
    /// Average delivery time assumed for drivers with no calibration
    /// data, in minutes (default: 30).
    pub default_avg_delivery_minutes: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            port_call_timeout: Duration::from_secs(10),
            notify_by_default: true,
            default_avg_delivery_minutes:
                fleetline_core::workload::DEFAULT_AVG_DELIVERY_MINUTES,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `FLEETLINE_PORT_TIMEOUT_SECS`    | `10`    |
    /// | `FLEETLINE_NOTIFY_DEFAULT`       | `true`  |
    /// | `FLEETLINE_AVG_DELIVERY_MINUTES` | `30`    |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port_call_timeout = parse_var("FLEETLINE_PORT_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.port_call_timeout);

        let notify_by_default =
            parse_var("FLEETLINE_NOTIFY_DEFAULT").unwrap_or(defaults.notify_by_default);

        let default_avg_delivery_minutes = parse_var("FLEETLINE_AVG_DELIVERY_MINUTES")
            .filter(|m: &f64| *m > 0.0)
            .unwrap_or(defaults.default_avg_delivery_minutes);

        Self {
            port_call_timeout,
            notify_by_default,
            default_avg_delivery_minutes,
        }
    }
}

/// Read and parse one env var; `None` when unset, warn-and-`None` when
/// set but unparseable.
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable env var");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
