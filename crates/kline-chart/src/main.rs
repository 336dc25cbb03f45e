/*
[INPUT]:  CLI arguments, layered configuration, OS shutdown signals
[OUTPUT]: Live kline chart in the terminal (or headless) with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use kline_chart::AppConfig;
use kline_chart::config::LogConfig;
use kline_chart::headless::run_headless;
use kline_chart::tui::{LOG_BUFFER_CAPACITY, LogBuffer, LogBufferHandle, LogWriterFactory};
use kline_feed::FeedClient;

#[derive(Parser, Debug)]
#[command(name = "kline-chart", version, about = "Live price chart for a Socket.IO kline feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Feed server address, overrides feed.url
    #[arg(long = "url", value_name = "URL")]
    url: Option<String>,
    /// tracing filter, overrides log.level and RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
    /// Log chart updates instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        #[arg(long)]
        force: bool,
        /// Skip the prompts and write the defaults
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    if let Some(Command::Init {
        output,
        force,
        defaults,
    }) = args.command
    {
        return cli::init::run_init(output, force, defaults);
    }

    let mut config = AppConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(url) = args.url {
        config.feed.url = url;
    }

    let tui_mode = !args.headless && !args.dry_run;
    let log_buffer = LogBuffer::shared(LOG_BUFFER_CAPACITY);
    let _file_guard = init_tracing(
        &config.log,
        args.log_level.as_deref(),
        tui_mode.then(|| log_buffer.clone()),
    )?;

    info!(
        config_path = ?args.config_path,
        url = %config.feed.url,
        event = %config.feed.event,
        headless = args.headless,
        dry_run = args.dry_run,
        "starting kline-chart"
    );

    config.validate().context("validate config")?;
    info!(transports = ?config.feed.transports, "configuration loaded");

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let mut feed = FeedClient::new(config.feed.clone()).context("create feed client")?;
    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    if tui_mode {
        kline_chart::tui::run_tui_with_log(&feed, &config, log_buffer, shutdown)
            .await
            .context("run terminal UI")?;
    } else {
        run_headless(&feed, &config.chart, shutdown)
            .await
            .context("run headless")?;
    }

    feed.join().await;
    info!("feed closed");
    Ok(())
}

/// `--log-level` wins, then `RUST_LOG`, then `log.level` from config
fn init_tracing(
    log: &LogConfig,
    cli_level: Option<&str>,
    buffer: Option<LogBufferHandle>,
) -> Result<Option<WorkerGuard>> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level).context("invalid log level")?,
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&log.level).context("invalid log level")?,
        },
    };

    let (file_layer, guard) = match &log.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &log.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = buffer.is_none().then(|| fmt::layer());
    let buffer_layer = buffer.map(|buffer| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(LogWriterFactory::new(buffer))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(buffer_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
