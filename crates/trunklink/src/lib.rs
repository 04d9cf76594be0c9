//! # trunklink: trunked-radio signalling decoder
//!
//! This crate decodes the digital signalling that trunked radio
//! systems embed in their FM voice channels: who is talking, to
//! which talkgroup, from where, under what encryption, and when
//! the call ends. Feed it demodulated audio samples and it emits
//! typed [`Message`]s.
//!
//! Two signalling paths are decoded, selected per receiver with
//! [`SignalPath`]:
//!
//! * **Audible**: 1200-baud 2FSK bursts inside the voice
//!   passband, demodulated by noncoherent tone correlation.
//! * **Sub-audible**: 300-baud level shifts beneath the voice,
//!   recovered with a DC blocker and a sign slicer.
//!
//! Both paths run the same machinery behind the front end:
//! zero-crossing symbol timing recovery with sync-driven gain
//! scheduling, sync-pattern framing for control words and
//! traffic bursts, CRC and block-code error correction, fragment
//! reassembly for link control and talker aliases, and a typed
//! decoder per opcode.
//!
//! ## Example
//!
//! Obtaining the audio is beyond the scope of this crate: use
//! the discriminator or "line out" audio of an FM receiver, or a
//! software-defined radio, mixed to mono. For the audible path,
//! resample to an integer multiple of 1200 Hz first.
//!
//! ```
//! use trunklink::{LinkReceiverBuilder, Message};
//!
//! # let some_audio_source_iterator = || std::iter::once(0.0f32);
//! #
//! // one receiver per logical channel, at your sampling rate
//! let mut rx = LinkReceiverBuilder::new(7200).build();
//!
//! // let audiosrc be any iterator of f32 PCM mono samples
//! let audiosrc = some_audio_source_iterator();
//! for message in rx.iter(audiosrc) {
//!     match message {
//!         Message::GroupVoice(call) => {
//!             println!("talkgroup {} keyed by {}", call.talkgroup(), call.source_radio());
//!         }
//!         Message::TalkerAlias(alias) => {
//!             println!("operator calls themselves {:?}", alias.alias());
//!         }
//!         other => println!("{}", other),
//!     }
//! }
//! ```
//!
//! Messages that fail error correction are delivered flagged
//! invalid rather than dropped; check [`Message::is_valid()`]
//! before trusting field values, and count the failures if you
//! care about link quality. Signalling this crate does not
//! understand arrives as [`Message::Unknown`] with the raw bits
//! preserved.
//!
//! ## Threading
//!
//! A [`LinkReceiver`] owns all of its state and never blocks; it
//! runs wherever its samples are. To hand messages to another
//! thread, give [`LinkReceiver::process()`] a [`QueueSink`]: a
//! bounded, non-blocking channel that drops (and counts) rather
//! than stalling the decoder when the consumer falls behind.
//!
//! ## Crate features
//!
//! * `chrono` (default): adds
//!   [`Message::timestamp_utc()`](Message::timestamp_utc) for
//!   rendering receive times as UTC datetimes. If enabled,
//!   `chrono` becomes part of this crate's public API.

#![allow(dead_code)]

mod bits;
mod builder;
mod edac;
mod message;
mod protocol;
mod receiver;
mod sink;

pub use bits::BitVector;
pub use builder::{LinkReceiverBuilder, SignalPath};
pub use message::{
    AliasAssembler, AliasFormat, EncryptionParameters, Envelope, FragmentAssembler, FragmentTag,
    GpsInfo, GroupVoice, Identifier, IdentifierValue, Message, Origin, PositionError, Role,
    ServiceOptions, ShortBurst, TalkerAlias, TalkerAliasBlock, TalkerAliasHeader, TerminatorData,
    UnitToUnitVoice, Unknown,
};
pub use receiver::{LinkReceiver, SourceIter, SyncState, TapEvent};
pub use sink::{MessageSink, QueueSink};
