use std::io::{self, Write};
use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};

use ookrx::{BurstListener, BurstWriter};

mod cli;

use cli::{Args, CliError};

// How often the receive loop wakes to check for Ctrl-C
const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn main() {
    match ooklog() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn ooklog() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    let group: SocketAddrV4 = args
        .address
        .parse()
        .with_context(|| format!("invalid multicast --address \"{}\"", args.address))
        .map_err(CliError::from)?;

    let mut listener = BurstListener::bind(group, args.interface)
        .with_context(|| format!("unable to join {} on {}", group, args.interface))
        .map_err(CliError::from)?;
    listener
        .set_poll_interval(Some(POLL_INTERVAL))
        .context("unable to set receive timeout")
        .map_err(CliError::from)?;
    info!("listening to {} on {}", group, args.interface);

    let mut writer = BurstWriter::new(sink_setup(&args)?);

    let terminate = Arc::new(AtomicBool::new(false));
    let flag = terminate.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("unable to install Ctrl-C handler")
    .map_err(CliError::from)?;

    let mut recorded = 0usize;
    while !terminate.load(Ordering::SeqCst) {
        let burst = match listener.poll().context("receive failure") {
            Ok(Some(burst)) => burst,
            Ok(None) => continue,
            Err(err) => return Err(err.into()),
        };

        info!(
            "got a burst: {} pulses, position={:?}",
            burst.pulses().len(),
            burst.position()
        );
        writer
            .write(&burst)
            .context("unable to append burst to archive")
            .map_err(CliError::from)?;
        recorded += 1;
    }

    writer
        .finish()
        .context("unable to finalize archive")
        .map_err(CliError::from)?;
    info!("recorded {} bursts", recorded);
    Ok(())
}

fn log_setup(args: &Args) {
    if std::env::var_os("RUST_LOG").is_none() {
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("ookrx", log_filter)
            .filter_module("ooklog", log_filter)
            .init();
    } else {
        pretty_env_logger::init();
    }
}

fn sink_setup(args: &Args) -> Result<Box<dyn Write>, CliError> {
    if args.output_is_stdout() {
        info!("writing archive to standard output");
        Ok(Box::new(io::stdout()))
    } else {
        info!("writing archive to \"{}\"", &args.output);
        Ok(Box::new(
            std::fs::File::create(&args.output)
                .with_context(|| format!("Unable to create --output \"{}\"", args.output))
                .map_err(CliError::from)?,
        ))
    }
}
