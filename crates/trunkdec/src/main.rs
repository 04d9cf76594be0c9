use std::io;
use std::io::IsTerminal;

use anyhow::{anyhow, Context};
use byteorder::{LittleEndian, ReadBytesExt};
use clap::Parser;
use log::{info, LevelFilter};

use trunklink::LinkReceiverBuilder;

mod app;
mod cli;

use cli::{Args, CliError};

fn main() {
    match trunkdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn trunkdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let mut builder = LinkReceiverBuilder::new(args.rate);
    builder
        .with_signal_path(args.path.into())
        .with_timeslot(args.timeslot)
        .with_dc_block_symbols(args.dc_block_symbols)
        .with_timing_gains(
            args.timing_gain_coarse,
            args.timing_gain_medium,
            args.timing_gain_fine,
        );
    let mut rx = builder.build();

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let mut inbuf = file_setup(&args, stdin_handle)?;

    // processing: read i16 from the input source until it runs out
    app::run(
        &args,
        &mut rx,
        std::iter::from_fn(|| inbuf.read_i16::<LittleEndian>().ok()),
    );

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
            .filter_module("trunklink", log_filter)
            .filter_module("trunkdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("link control decoder reading standard input");
        if !std::io::stdin().is_terminal() {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read audio samples from a terminal.

Pipe a source of raw uncompressed audio from sox, rtl_fm, or
similar into this program."
            ))
        }
    } else {
        info!("link control decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}
