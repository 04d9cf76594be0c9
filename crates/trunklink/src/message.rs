//! Decoded signalling messages
//!
//! Every framed word ends up here. [`decode_control`] runs the
//! CRC over a full-length control word and [`dispatch`] routes
//! the corrected bits to a typed decoder by opcode and vendor.
//! Link control payloads reassembled from traffic bursts take
//! the same dispatch path.
//!
//! Decoding never fails: signalling this crate does not
//! understand comes out as [`Message::Unknown`] with the raw
//! bits preserved, and words the error correction gave up on
//! are delivered flagged invalid rather than dropped.

use std::fmt;

use phf::phf_map;

use crate::bits::BitVector;
use crate::edac::crc;

mod alias;
mod fragment;
mod identifier;
mod lc;

pub use alias::{AliasAssembler, AliasFormat};
pub use fragment::{FragmentAssembler, FragmentTag};
pub use identifier::{Identifier, IdentifierValue, Origin, Role};
pub use lc::{
    EncryptionParameters, Envelope, GpsInfo, GroupVoice, PositionError, ServiceOptions,
    ShortBurst, TalkerAlias, TalkerAliasBlock, TalkerAliasHeader, TerminatorData,
    UnitToUnitVoice, Unknown,
};

/// Opcode of the first talker alias continuation block
///
/// Blocks two and three use the two following opcodes.
pub(crate) const OPCODE_ALIAS_BLOCK_1: u8 = 5;

/// One decoded signalling message
///
/// Produced by the receiver for every control word, every
/// reassembled link control payload, and every completed talker
/// alias. Match on the variant for typed field access, or use
/// the accessors here for the metadata every message carries.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// A talkgroup call is up on this channel
    GroupVoice(GroupVoice),

    /// A private call between two radios is up on this channel
    UnitToUnitVoice(UnitToUnitVoice),

    /// First part of a talker alias
    ///
    /// Usually not interesting on its own; feed it to an
    /// [`AliasAssembler`] and wait for [`Message::TalkerAlias`].
    TalkerAliasHeader(TalkerAliasHeader),

    /// Continuation part of a talker alias
    TalkerAliasBlock(TalkerAliasBlock),

    /// A completely assembled talker alias
    TalkerAlias(TalkerAlias),

    /// The transmitting radio's GPS position
    GpsInfo(GpsInfo),

    /// The current call is ending
    TerminatorData(TerminatorData),

    /// Encryption parameters for the current call
    EncryptionParameters(EncryptionParameters),

    /// A traffic burst that carried its payload inline
    ShortBurst(ShortBurst),

    /// Signalling this crate does not interpret
    Unknown(Unknown),
}

/// Typed decoder for one opcode
type Decoder = fn(Envelope) -> Message;

/// Decoder dispatch, keyed on `(vendor << 8) | opcode`
static DECODERS: phf::Map<u16, Decoder> = phf_map! {
    // voice channel grants
    0x0000u16 => GroupVoice::decode as Decoder,
    0x0003u16 => UnitToUnitVoice::decode as Decoder,

    // talker alias, header plus three continuation blocks
    0x0004u16 => TalkerAliasHeader::decode as Decoder,
    0x0005u16 => TalkerAliasBlock::decode as Decoder,
    0x0006u16 => TalkerAliasBlock::decode as Decoder,
    0x0007u16 => TalkerAliasBlock::decode as Decoder,

    // position reporting
    0x0008u16 => GpsInfo::decode as Decoder,

    // call teardown
    0x0010u16 => TerminatorData::decode as Decoder,

    // vendor 16 extension
    0x1020u16 => EncryptionParameters::decode as Decoder,
};

/// Route a corrected word to its typed decoder
///
/// Opcodes are qualified by the vendor octet; a known opcode
/// under an unknown vendor is still [`Message::Unknown`].
pub(crate) fn dispatch(envelope: Envelope) -> Message {
    let key = (u16::from(envelope.vendor()) << 8) | u16::from(envelope.opcode());
    match DECODERS.get(&key) {
        Some(decoder) => decoder(envelope),
        None => Unknown::decode(envelope),
    }
}

/// Decode a framed control word
///
/// Runs CRC error correction over the word, records the
/// corrected-bit count, and dispatches on the opcode. One
/// repaired bit is trusted; two-bit repairs and unrecoverable
/// words are still decoded but delivered invalid, with a
/// negative corrected-bit count.
pub(crate) fn decode_control(mut word: BitVector, timestamp: u64, timeslot: u8) -> Message {
    let corrected = match crc::correct(&mut word) {
        count if count > 1 => -count,
        count => count,
    };
    word.set_corrected_count(corrected);
    dispatch(Envelope::new(word, timestamp, timeslot, Origin::ControlWord))
}

impl Message {
    /// The word and its delivery metadata
    pub fn envelope(&self) -> &Envelope {
        match self {
            Message::GroupVoice(msg) => msg.envelope(),
            Message::UnitToUnitVoice(msg) => msg.envelope(),
            Message::TalkerAliasHeader(msg) => msg.envelope(),
            Message::TalkerAliasBlock(msg) => msg.envelope(),
            Message::TalkerAlias(msg) => msg.envelope(),
            Message::GpsInfo(msg) => msg.envelope(),
            Message::TerminatorData(msg) => msg.envelope(),
            Message::EncryptionParameters(msg) => msg.envelope(),
            Message::ShortBurst(msg) => msg.envelope(),
            Message::Unknown(msg) => msg.envelope(),
        }
    }

    /// Receive time, in milliseconds since the Unix epoch
    pub fn timestamp(&self) -> u64 {
        self.envelope().timestamp()
    }

    /// Receive time as a UTC datetime
    ///
    /// Requires the `chrono` feature. Timestamps from before the
    /// epoch clamp to the epoch.
    #[cfg(feature = "chrono")]
    pub fn timestamp_utc(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.timestamp() as i64)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
    }

    /// Timeslot the message arrived on
    pub fn timeslot(&self) -> u8 {
        self.envelope().timeslot()
    }

    /// True unless error correction gave up on this message
    ///
    /// Invalid messages are delivered anyway so callers can count
    /// them; their field values are unreliable.
    pub fn is_valid(&self) -> bool {
        self.envelope().is_valid()
    }

    /// Bits repaired by error correction, negative if uncorrectable
    pub fn corrected_count(&self) -> i32 {
        self.envelope().corrected_count()
    }

    /// Signalling path that carried this message
    pub fn origin(&self) -> Origin {
        self.envelope().origin()
    }

    /// Opcode, for the message kinds that carry one
    ///
    /// Assembled aliases and short bursts have no opcode field.
    pub fn opcode(&self) -> Option<u8> {
        match self {
            Message::TalkerAlias(_) | Message::ShortBurst(_) => None,
            other => Some(other.envelope().opcode()),
        }
    }

    /// Vendor code, for the message kinds that carry one
    pub fn vendor(&self) -> Option<u8> {
        match self {
            Message::TalkerAlias(_) | Message::ShortBurst(_) => None,
            other => Some(other.envelope().vendor()),
        }
    }

    /// Radios, talkgroups, and other addressing this message names
    pub fn identifiers(&self) -> Vec<Identifier> {
        match self {
            Message::GroupVoice(msg) => msg.identifiers(),
            Message::UnitToUnitVoice(msg) => msg.identifiers(),
            Message::TalkerAliasHeader(msg) => msg.identifiers(),
            Message::TalkerAliasBlock(msg) => msg.identifiers(),
            Message::TalkerAlias(msg) => msg.identifiers(),
            Message::GpsInfo(msg) => msg.identifiers(),
            Message::TerminatorData(msg) => msg.identifiers(),
            Message::EncryptionParameters(msg) => msg.identifiers(),
            Message::ShortBurst(msg) => msg.identifiers(),
            Message::Unknown(msg) => msg.identifiers(),
        }
    }

    /// Short human-readable name for the message kind
    fn label(&self) -> &'static str {
        match self {
            Message::GroupVoice(_) => "group voice",
            Message::UnitToUnitVoice(_) => "unit-to-unit voice",
            Message::TalkerAliasHeader(_) => "talker alias header",
            Message::TalkerAliasBlock(_) => "talker alias block",
            Message::TalkerAlias(_) => "talker alias",
            Message::GpsInfo(_) => "position report",
            Message::TerminatorData(_) => "call terminator",
            Message::EncryptionParameters(_) => "encryption parameters",
            Message::ShortBurst(_) => "short burst",
            Message::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        for identifier in self.identifiers() {
            write!(f, ", {}", identifier)?;
        }
        Ok(())
    }
}
