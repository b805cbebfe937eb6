#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod queue;

pub use config::Config;

use crate::config::{ConfigFairing, MetricsFairing, QueueFairing};
use crate::logging::LoggerFairing;

/// Assemble the rocket instance, ready for ignition.
///
/// The fairings load the configuration, connect to the shared vote store,
/// and set up the metrics client; any of the first two failing aborts the
/// launch with a logged error.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(QueueFairing)
        .attach(MetricsFairing)
        .attach(LoggerFairing)
}

#[cfg(test)]
pub(crate) async fn test_client(
    queue: queue::VoteQueue,
) -> (rocket::local::asynchronous::Client, metrics::Recorder) {
    let recorder = metrics::Recorder::default();
    let rocket = rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .manage(queue)
        .manage(metrics::Metrics::recording(recorder.clone()));
    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap();
    (client, recorder)
}
