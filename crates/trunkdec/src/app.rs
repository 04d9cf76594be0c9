//! Decode loop and message printing
//!
//! Pulls messages out of the receiver until the input is
//! exhausted, printing each one with a wall-clock timestamp.
//! The receiver's message clock counts milliseconds of audio;
//! offsetting it from the time decoding started turns it into
//! wall time, which is exact for live input and "as if live"
//! for recordings.

use chrono::{DateTime, Duration, Utc};
use log::info;

use trunklink::{LinkReceiver, Message};

use crate::cli::Args;

/// Totals reported when the input runs out
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    /// Messages decoded, including invalid ones
    pub decoded: u64,

    /// Messages that failed error correction
    pub invalid: u64,
}

/// Run the decode loop
///
/// Consumes `input` to exhaustion through a fully-initialized
/// `receiver`, printing every decoded message unless `args`
/// asked for quiet. Returns the decode totals; they are also
/// logged at info level.
pub fn run<I>(args: &Args, receiver: &mut LinkReceiver, input: I) -> Stats
where
    I: Iterator<Item = i16>,
{
    let started = Utc::now();
    let mut stats = Stats::default();

    for message in receiver.iter(input.map(f32::from)) {
        stats.decoded += 1;
        if !message.is_valid() {
            stats.invalid += 1;
        }
        if !args.quiet {
            print_message(&started, &message);
        }
    }

    info!(
        "input exhausted: {} messages decoded, {} failed error correction",
        stats.decoded, stats.invalid
    );
    stats
}

// One line per message: time, timeslot, message, validity
fn print_message(started: &DateTime<Utc>, message: &Message) {
    let at = *started + Duration::milliseconds(message.timestamp() as i64);
    let validity = if message.is_valid() { "" } else { " INVALID" };
    println!(
        "{} TS{} {}{}",
        at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        message.timeslot(),
        message,
        validity
    );
}
