use std::io;
use std::net::SocketAddrV4;

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};

use ookrx::{BurstArchive, BurstPublisher};

mod cli;

use cli::{Args, CliError};

fn main() {
    match ookplay() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn ookplay() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    let group: SocketAddrV4 = args
        .address
        .parse()
        .with_context(|| format!("invalid multicast --address \"{}\"", args.address))
        .map_err(CliError::from)?;

    let publisher = BurstPublisher::connect(group, args.interface)
        .with_context(|| format!("unable to publish to {} from {}", group, args.interface))
        .map_err(CliError::from)?;
    info!("publishing to {} from {}", group, args.interface);

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    let mut archive = BurstArchive::new(inbuf);
    let bursts = archive
        .bursts()
        .context("unable to read burst archive")
        .map_err(CliError::from)?;

    let mut replayed = 0usize;
    for burst in bursts {
        let burst = burst
            .with_context(|| format!("error reading burst {} from archive", replayed + 1))
            .map_err(CliError::from)?;

        info!(
            "replaying burst: {} pulses, position={:?}",
            burst.pulses().len(),
            burst.position()
        );
        publisher
            .send(&burst)
            .context("unable to transmit burst")
            .map_err(CliError::from)?;
        replayed += 1;
    }

    info!("replayed {} bursts", replayed);
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
            .filter_module("ookplay", log_filter)
            .init();
    } else {
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, CliError> {
    if args.input_is_stdin() {
        info!("reading archive from standard input");
        Ok(Box::new(io::BufReader::new(stdin)))
    } else {
        info!("reading archive from \"{}\"", &args.input);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.input)
                .with_context(|| format!("Unable to open --input \"{}\"", args.input))
                .map_err(CliError::from)?,
        )))
    }
}
