//! # forest
//!
//! Command line front end for `forest_core`: computes stand metrics from
//! JSON measurement requests and manages a local store of measurement
//! records. Results are printed as JSON on stdout; logs go to stderr.

mod args;
mod commands;
mod config;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use forest_core::MetricsError;

use crate::args::Cli;
use crate::commands::{execute_command, RunContext};
use crate::config::CliConfig;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let result = CliConfig::load().and_then(|config| {
        let ctx = RunContext::new(&cli, config);
        tracing::debug!(store = %ctx.store_path.display(), user = %ctx.user, "resolved context");
        execute_command(&cli, &ctx)
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        if let Some(metrics_err) = e.downcast_ref::<MetricsError>() {
            if let Ok(json) = serde_json::to_string_pretty(metrics_err) {
                eprintln!("{}", json);
            }
        }
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // RUST_LOG refines, but never widens, the -d level
    let env_filter = EnvFilter::builder()
        .with_default_directive(filter.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(env_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
