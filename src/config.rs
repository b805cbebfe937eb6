use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::metrics::Metrics;
use crate::queue::{RedisQueue, VoteQueue};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint. The values are read once at launch and are
/// immutable for the process lifetime.
#[derive(Deserialize)]
pub struct Config {
    option_a: String,
    option_b: String,
}

impl Config {
    /// The first option on the ballot.
    pub fn option_a(&self) -> &str {
        &self.option_a
    }

    /// The second option on the ballot.
    pub fn option_b(&self) -> &str {
        &self.option_b
    }

    /// Is this value one of the two configured options?
    pub fn is_option(&self, value: &str) -> bool {
        value == self.option_a || value == self.option_b
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the shared vote store.
#[derive(Deserialize)]
struct QueueConfig {
    // e.g. "redis://redis:6379"
    queue_url: String,
}

/// A fairing that loads the queue config, connects to the shared store, and
/// places a [`VoteQueue`] into managed state. An unreachable store at launch
/// is a critical failure; once launched, store failures only fail the
/// requests that hit them.
pub struct QueueFairing;

#[rocket::async_trait]
impl Fairing for QueueFairing {
    fn info(&self) -> Info {
        Info {
            name: "Vote queue",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<QueueConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load queue config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded queue config, connecting to the vote store...");

        let queue = match RedisQueue::connect(&config.queue_url).await {
            Ok(queue) => queue,
            Err(e) => {
                error!("Failed to connect to the vote store: {e}");
                return Err(rocket);
            }
        };
        info!("Connected to the vote store");

        Ok(rocket.manage(VoteQueue::new(queue)))
    }
}

/// Configuration for the metrics backend.
#[derive(Deserialize)]
struct MetricsConfig {
    // Statsd-compatible host:port, written to over UDP.
    statsd_addr: String,
}

/// A fairing that sets up the statsd client. Metrics are best-effort: if the
/// socket cannot be created the server still launches, with counters
/// disabled.
pub struct MetricsFairing;

#[rocket::async_trait]
impl Fairing for MetricsFairing {
    fn info(&self) -> Info {
        Info {
            name: "Metrics",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<MetricsConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load metrics config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let metrics = match Metrics::statsd(&config.statsd_addr) {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("Failed to set up metrics, counters disabled: {e}");
                Metrics::disabled()
            }
        };

        Ok(rocket.manage(metrics))
    }
}
