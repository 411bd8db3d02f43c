use std::io;

use anyhow::Context;
use clap::Parser;
use log::{info, warn, LevelFilter};

use ookrx::{BurstArchive, OokDecoder};

mod cli;

use cli::{Args, CliError};

fn main() {
    match ookdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn ookdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    let decoder = OokDecoder::new().with_tolerance(args.tolerance);

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    let mut archive = BurstArchive::new(inbuf);
    let bursts = archive
        .bursts()
        .context("unable to read burst archive")
        .map_err(CliError::from)?;

    let mut sequence = 0usize;
    let mut failures = 0usize;
    for burst in bursts {
        let burst = burst
            .with_context(|| format!("error reading burst {} from archive", sequence + 1))
            .map_err(CliError::from)?;
        sequence += 1;

        info!(
            "burst {}: {} pulses, position={:?}, offset={}Hz",
            sequence,
            burst.pulses().len(),
            burst.position(),
            burst.pulses()[0].frequency_offset
        );

        match decoder.decode(&burst) {
            Ok(decoded) => {
                if !args.quiet {
                    let payload = if args.bits {
                        decoded.bit_string()
                    } else {
                        decoded.nibble_string()
                    };
                    let truncated = if decoded.terminated() { "" } else { " !" };
                    println!(
                        "{:04} {:>12} {}{}",
                        sequence,
                        burst.position().as_nanos(),
                        payload,
                        truncated
                    );
                }
            }
            Err(err) => {
                warn!("burst {}: decode failed: {}", sequence, err);
                failures += 1;
            }
        }
    }

    info!("decoded {} of {} bursts", sequence - failures, sequence);
    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("ookrx", log_filter)
            .filter_module("ookdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, CliError> {
    if args.input_is_stdin() {
        info!("burst decoder reading standard input");
        Ok(Box::new(io::BufReader::new(stdin)))
    } else {
        info!("burst decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))
                .map_err(CliError::from)?,
        )))
    }
}
