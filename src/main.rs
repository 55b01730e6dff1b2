// src/main.rs

//! isofeed: scrapes Linux distribution mirrors on a schedule and serves
//! the accumulated release feed as RSS.
//!
//! Two long-lived activities share one shutdown signal: the producer loop
//! (scrape, persist, sleep) and the feed server. A fatal producer error
//! raises the signal so the server stops too; an external termination
//! request (ctrl-c) does the same from the other side.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use isofeed::config::Config;
use isofeed::error::Result;
use isofeed::fetch;
use isofeed::pipeline::spawn_producer;
use isofeed::server::FeedServer;
use isofeed::shutdown::Shutdown;

#[derive(Parser, Debug)]
#[command(
    name = "isofeed",
    version,
    about = "Serves an RSS feed of Linux installer images scraped from distribution mirrors"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "/etc/isofeed/config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let env: HashMap<String, String> = std::env::vars().collect();
    let config = Arc::new(Config::load(&cli.config, &env)?);

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("termination requested");
                shutdown.raise();
            }
        });
    }

    let client = fetch::build_client(&config.http)?;
    let producer = spawn_producer(Arc::clone(&config), client, shutdown.clone());

    let server = FeedServer::bind(config.port, config.rss_cache.clone()).await?;
    log::info!("serving RSS on 0.0.0.0:{}", config.port);
    server.serve(shutdown).await?;

    // The server has stopped; collect the producer's exit so a fatal
    // scrape failure becomes a non-zero process exit.
    let outcome = producer.await?;
    log::info!("stopped server");
    if let Err(err) = outcome {
        log::error!("error in scraper: {err}");
        return Err(err);
    }
    Ok(())
}
