use std::fmt::Display;
use std::net::Ipv4Addr;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Standard output filename
const STDOUT_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program joins a multicast group, receives OOK pulse bursts published by a capture daemon, and appends each burst to a tar archive for later decoding with ookdec.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program joins a multicast group, receives OOK pulse bursts published by a capture daemon, and appends each burst to a tar archive for later decoding with ookdec.

Each received datagram is expected to carry exactly one burst record; datagrams that do not decode are logged and discarded. Recording continues until interrupted with Ctrl-C, at which point the archive footer is written and the program exits.

    ooklog --interface 192.168.1.17 --output capture.tar
    ookdec --file capture.tar
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Multicast group to listen to, as address:port
    #[arg(short, long, default_value_t = String::from("236.0.0.1:3636"))]
    pub address: String,

    /// IPv4 address of the interface on which to listen
    #[arg(short, long, default_value_t = Ipv4Addr::LOCALHOST)]
    pub interface: Ipv4Addr,

    /// Output archive (or "-" for stdout)
    #[arg(short, long, default_value_t = STDOUT_FILE.to_string())]
    pub output: String,
}

impl Args {
    /// Return true if the user requests output to stdout
    pub fn output_is_stdout(&self) -> bool {
        self.output == STDOUT_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
