use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program reads an archive of captured OOK pulse bursts, decodes each burst's Manchester-coded pulse timing, and prints the recovered data one line per burst.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program reads an archive of captured OOK pulse bursts, as written by ooklog, decodes each burst's Manchester-coded pulse timing, and prints the recovered data one line per burst.

Each output line carries the burst's sequence number in the archive, its capture position, and the decoded payload as LSB-first hex nibbles. Bits left over after the last full nibble are appended as "+b:<bits>". A trailing "!" marks a burst that ran out of pulses without an end-of-transmission marker; its payload may be truncated.

Bursts that fail to decode are logged and skipped; decoding continues with the next burst.

    ooklog --output capture.tar
    ookdec --file capture.tar

Raise -v to see the timing classes the clusterer found for each burst.
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

    /// Print NOTHING, not even decoded bursts
    #[arg(short, long)]
    pub quiet: bool,

    /// Input archive (or "-" for stdin)
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Clustering tolerance (fractional; 0.2 allows ±20%)
    #[arg(short, long, default_value_t = 0.2)]
    pub tolerance: f64,

    /// Print raw bits instead of hex nibbles
    #[arg(short, long)]
    pub bits: bool,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
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
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
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
