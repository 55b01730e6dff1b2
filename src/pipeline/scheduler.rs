// src/pipeline/scheduler.rs

//! The producer loop: runs scrape cycles on the configured schedule.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, TimeDelta};
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::config::{Config, StartAt};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::shutdown::Shutdown;

use super::cycle;

/// Spawn the background producer loop.
///
/// The returned handle resolves when the loop stops: `Ok(())` after a
/// requested shutdown, `Err` when a cycle failed fatally (in which case
/// the loop has already raised the shared shutdown signal).
pub fn spawn_producer(
    config: Arc<Config>,
    client: Client,
    shutdown: Shutdown,
) -> JoinHandle<Result<()>> {
    tokio::spawn(run_loop(config, client, shutdown))
}

async fn run_loop(config: Arc<Config>, client: Client, shutdown: Shutdown) -> Result<()> {
    let fetcher = PageFetcher::from_client(client.clone());
    let interval = config.check_every.interval();

    while !shutdown.is_raised() {
        if let Err(err) = cycle::run_cycle(&config, &fetcher).await {
            log::error!("scrape cycle failed, shutting down: {err}");
            shutdown.raise();
            return Err(err);
        }

        ping_healthcheck(&client, config.healthcheck_url.as_deref()).await;

        let now = Local::now().naive_local();
        let wake = next_wake(now, interval, &config.start_at);
        let pause = (wake - now).to_std().unwrap_or_default();
        log::info!("next scrape at {wake}");
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = shutdown.raised() => {}
        }
    }
    Ok(())
}

/// Compute the next wake-up time.
///
/// The candidate is one interval ahead of `now` with its hour and minute
/// snapped to `start_at`; only the sub-day remainder of the gap is kept,
/// so successive wake-ups land on the wall-clock anchor instead of
/// drifting with whenever the process happened to start. The result is
/// never before `now`.
pub fn next_wake(now: NaiveDateTime, interval: TimeDelta, start_at: &StartAt) -> NaiveDateTime {
    let candidate = now + interval;
    let snapped = candidate
        .date()
        .and_hms_opt(u32::from(start_at.hour), u32::from(start_at.minute), 0)
        .unwrap_or(candidate);
    let secs = (snapped - now).num_seconds().rem_euclid(86_400);
    now + TimeDelta::seconds(secs)
}

/// Best-effort notification that a cycle completed. Never fatal.
async fn ping_healthcheck(client: &Client, url: Option<&str>) {
    let Some(url) = url else { return };
    for _ in 0..2 {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => return,
            Ok(response) => log::debug!("healthcheck ping got {}", response.status()),
            Err(err) => log::debug!("healthcheck ping error: {err}"),
        }
    }
    log::error!("failed to ping healthcheck: {url}");
}
