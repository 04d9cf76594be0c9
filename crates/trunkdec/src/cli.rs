use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser, ValueEnum};

use trunklink::SignalPath;

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts raw PCM samples in signed 16-bit (i16) format, at the given sampling --rate, and decodes any trunked-radio link control signalling that is present. Decoded messages are printed one per line.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts raw PCM samples in signed 16-bit (i16) format, at the given sampling --rate, and decodes any trunked-radio link control signalling that is present. Decoded messages are printed one per line, timestamped and with their talkgroup, radio, position, and alias identifiers.

The input must be FM-demodulated (discriminator) audio. You can pipe in an audio file with sox

    sox input.wav -t raw -r 7.2k -e signed -b 16 -c 1 - \
        | trunkdec -r 7200

or decode the sub-audible path of a live channel from rtl_fm

    rtl_fm -f 453.2125M -s 8000 \
        | trunkdec -r 8000 --path sub-audible

One invocation decodes one signalling path of one channel. A channel that carries both paths needs two invocations fed the same audio.

Messages that fail error correction are still printed, marked INVALID; pass -q to suppress all output and watch the exit-time statistics with -v instead.
"#;

const ADVANCED: &str = "Advanced Demodulator Options";

/// Signalling path selection, as a command-line value
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PathArg {
    /// In-band 1200-baud FSK bursts
    Audible,

    /// 300-baud signalling beneath the voice
    SubAudible,
}

impl From<PathArg> for SignalPath {
    fn from(arg: PathArg) -> SignalPath {
        match arg {
            PathArg::Audible => SignalPath::Audible,
            PathArg::SubAudible => SignalPath::SubAudible,
        }
    }
}

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

    /// Print NOTHING, not even decoded messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Sampling rate (Hz)
    ///
    /// Set to the sampling rate of your audio source. For the
    /// audible path, resample to an integer multiple of 1200 Hz
    /// first; 7200 works well. The sub-audible path is happy with
    /// the usual 8000.
    #[arg(short, long, default_value_t = 7200)]
    pub rate: u32,

    /// Signalling path to decode
    #[arg(short, long, value_enum, default_value_t = PathArg::Audible)]
    pub path: PathArg,

    /// Timeslot label for decoded messages (0 or 1)
    ///
    /// Purely a label: if an upstream demultiplexer feeds this
    /// program a single timeslot's audio, set it here so the
    /// output says where the messages came from.
    #[arg(long, default_value_t = 0)]
    #[arg(value_parser = value_parser!(u8).range(0..2))]
    pub timeslot: u8,

    /// Input file (or "-" for stdin)
    ///
    /// The input must be one-channel (mono), signed 16-bit
    /// little-endian at --rate.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// DC tracker window length (symbol periods)
    #[arg(long, default_value_t = 8.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub dc_block_symbols: f32,

    /// Timing loop gain while searching for sync
    #[arg(long, default_value_t = 0.33)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_gain_coarse: f32,

    /// Timing loop gain after one sync detection
    #[arg(long, default_value_t = 0.11)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_gain_medium: f32,

    /// Timing loop gain while tracking a steady signal
    #[arg(long, default_value_t = 0.05)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_gain_fine: f32,
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

    #[test]
    fn test_path_arg() {
        assert_eq!(
            SignalPath::SubAudible,
            SignalPath::from(PathArg::SubAudible)
        );
        assert_eq!(SignalPath::Audible, SignalPath::from(PathArg::Audible));
    }
}
