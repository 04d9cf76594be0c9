//! Typed message bodies
//!
//! Every corrected word becomes one of the typed structs here,
//! wrapped in the [`Message`](super::Message) enum. Each struct
//! holds an [`Envelope`] with the raw bits and extracts its
//! fields at fixed bit offsets on demand. The offsets are part
//! of the wire contract and are documented on each accessor.
//!
//! Link control payloads are 72 bits; control words carry the
//! same leading layout but run 96 bits with a trailing CRC.
//! Accessors never read past the envelope they were constructed
//! over.

use std::fmt;

use crate::bits::BitVector;

use super::alias::AliasFormat;
use super::identifier::{Identifier, IdentifierValue, Origin, Role};
use super::Message;

// position counts are fixed-point fractions of the full circle
const LONGITUDE_SCALE: f64 = 360.0 / ((1u64 << 25) as f64);
const LATITUDE_SCALE: f64 = 180.0 / ((1u64 << 24) as f64);

/// A decoded word and its delivery metadata
///
/// Wraps the corrected bits together with the receive timestamp,
/// the timeslot the word arrived on, and the signalling path
/// that produced it. The validity flag summarizes error
/// correction: words whose corrected-bit count went negative are
/// carried as invalid rather than dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    bits: BitVector,
    timestamp: u64,
    timeslot: u8,
    valid: bool,
    origin: Origin,
}

impl Envelope {
    pub(crate) fn new(bits: BitVector, timestamp: u64, timeslot: u8, origin: Origin) -> Self {
        let valid = bits.corrected_count() >= 0;
        Self {
            bits,
            timestamp,
            timeslot,
            valid,
            origin,
        }
    }

    /// The corrected word
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// Receive time, in milliseconds since the Unix epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Timeslot the word arrived on
    pub fn timeslot(&self) -> u8 {
        self.timeslot
    }

    /// True unless error correction gave up on this word
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Signalling path that carried this word
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Corrected bit count, negative if uncorrectable
    pub fn corrected_count(&self) -> i32 {
        self.bits.corrected_count()
    }

    /// Opcode, bits `[2..8)`
    pub fn opcode(&self) -> u8 {
        self.bits.bits(2..8) as u8
    }

    /// Vendor code, bits `[8..16)`
    pub fn vendor(&self) -> u8 {
        self.bits.bits(8..16) as u8
    }

    /// Protect flag, bit 0
    pub fn protect(&self) -> bool {
        self.bits.get(0)
    }
}

/// Voice service flags, one octet
///
/// Carried by the voice channel user messages. The flag bits
/// follow the common air interface layout: emergency `0x80`,
/// privacy `0x40`, broadcast `0x08`, and a three-bit priority in
/// the least significant positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceOptions(u8);

impl ServiceOptions {
    /// Emergency service requested
    pub fn is_emergency(&self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Payload is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.0 & 0x40 != 0
    }

    /// One-way broadcast call
    pub fn is_broadcast(&self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Call priority, 0 through 7
    pub fn priority(&self) -> u8 {
        self.0 & 0x07
    }

    /// The raw octet
    pub fn as_octet(&self) -> u8 {
        self.0
    }
}

impl From<u8> for ServiceOptions {
    fn from(octet: u8) -> Self {
        Self(octet)
    }
}

impl fmt::Display for ServiceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for (set, label) in [
            (self.is_emergency(), "emergency"),
            (self.is_encrypted(), "encrypted"),
            (self.is_broadcast(), "broadcast"),
        ] {
            if set {
                if wrote {
                    write!(f, " ")?;
                }
                write!(f, "{}", label)?;
                wrote = true;
            }
        }
        if self.priority() != 0 {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "priority {}", self.priority())?;
            wrote = true;
        }
        if !wrote {
            write!(f, "none")?;
        }
        Ok(())
    }
}

/// Group voice channel user
///
/// Announces which talkgroup and which transmitting radio own
/// the voice channel.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupVoice {
    envelope: Envelope,
}

impl GroupVoice {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::GroupVoice(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Service flags, bits `[16..24)`
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions::from(self.envelope.bits().bits(16..24) as u8)
    }

    /// Addressed talkgroup, bits `[24..48)`
    pub fn talkgroup(&self) -> u32 {
        self.envelope.bits().bits(24..48)
    }

    /// Transmitting radio, bits `[48..72)`
    pub fn source_radio(&self) -> u32 {
        self.envelope.bits().bits(48..72)
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        vec![
            Identifier::new(
                IdentifierValue::Talkgroup(self.talkgroup()),
                Role::To,
                self.envelope.origin(),
            ),
            Identifier::new(
                IdentifierValue::Radio(self.source_radio()),
                Role::From,
                self.envelope.origin(),
            ),
        ]
    }
}

/// Individual voice channel user
#[derive(Clone, Debug, PartialEq)]
pub struct UnitToUnitVoice {
    envelope: Envelope,
}

impl UnitToUnitVoice {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::UnitToUnitVoice(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Service flags, bits `[16..24)`
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions::from(self.envelope.bits().bits(16..24) as u8)
    }

    /// Addressed radio, bits `[24..48)`
    pub fn destination_radio(&self) -> u32 {
        self.envelope.bits().bits(24..48)
    }

    /// Transmitting radio, bits `[48..72)`
    pub fn source_radio(&self) -> u32 {
        self.envelope.bits().bits(48..72)
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        vec![
            Identifier::new(
                IdentifierValue::Radio(self.destination_radio()),
                Role::To,
                self.envelope.origin(),
            ),
            Identifier::new(
                IdentifierValue::Radio(self.source_radio()),
                Role::From,
                self.envelope.origin(),
            ),
        ]
    }
}

/// Talker alias header
///
/// First part of a multi-message alias transfer. Declares the
/// character format and length, then carries the first fragment
/// of the alias bits. [`AliasAssembler`](super::alias::AliasAssembler)
/// collects the header and its continuation blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct TalkerAliasHeader {
    envelope: Envelope,
}

impl TalkerAliasHeader {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::TalkerAliasHeader(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Character format, bits `[16..18)`
    pub fn format(&self) -> AliasFormat {
        AliasFormat::from(self.envelope.bits().bits(16..18))
    }

    /// Declared character count, bits `[18..23)`
    pub fn character_count(&self) -> u8 {
        self.envelope.bits().bits(18..23) as u8
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

/// Talker alias continuation block
///
/// Blocks 1 through 3 follow the header, each carrying 56 more
/// bits of the alias, `[16..72)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TalkerAliasBlock {
    envelope: Envelope,
}

impl TalkerAliasBlock {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::TalkerAliasBlock(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Block number, 1 through 3
    pub fn block_index(&self) -> u8 {
        self.envelope.opcode() - super::OPCODE_ALIAS_BLOCK_1 + 1
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

/// A fully assembled talker alias
///
/// Produced by the alias assembler once the header and all
/// required blocks for the declared length have arrived. The
/// envelope holds the concatenated alias bits.
#[derive(Clone, Debug, PartialEq)]
pub struct TalkerAlias {
    envelope: Envelope,
    alias: String,
    format: AliasFormat,
}

impl TalkerAlias {
    pub(crate) fn new(envelope: Envelope, alias: String, format: AliasFormat) -> Self {
        Self {
            envelope,
            alias,
            format,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The decoded alias text, empty if decoding failed
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Character format the alias was sent in
    pub fn format(&self) -> AliasFormat {
        self.format
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        vec![Identifier::new(
            IdentifierValue::Alias(self.alias.clone()),
            Role::From,
            self.envelope.origin(),
        )]
    }
}

/// Reported position accuracy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionError {
    LessThan2m,
    LessThan20m,
    LessThan200m,
    LessThan2km,
    LessThan20km,
    LessThan200km,
    MoreThan200km,
    Unknown,
}

impl From<u32> for PositionError {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::LessThan2m,
            1 => Self::LessThan20m,
            2 => Self::LessThan200m,
            3 => Self::LessThan2km,
            4 => Self::LessThan20km,
            5 => Self::LessThan200km,
            6 => Self::MoreThan200km,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LessThan2m => "< 2 m",
            Self::LessThan20m => "< 20 m",
            Self::LessThan200m => "< 200 m",
            Self::LessThan2km => "< 2 km",
            Self::LessThan20km => "< 20 km",
            Self::LessThan200km => "< 200 km",
            Self::MoreThan200km => "> 200 km",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", text)
    }
}

/// Transmitting radio's reported position
#[derive(Clone, Debug, PartialEq)]
pub struct GpsInfo {
    envelope: Envelope,
}

impl GpsInfo {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::GpsInfo(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Position accuracy, bits `[20..23)`
    pub fn position_error(&self) -> PositionError {
        PositionError::from(self.envelope.bits().bits(20..23))
    }

    /// Longitude in signed degrees, bits `[23..47)`
    ///
    /// The wire value is a two's-complement count of
    /// 360/2^25 degree steps.
    pub fn longitude(&self) -> f64 {
        self.envelope.bits().signed(23..47) as f64 * LONGITUDE_SCALE
    }

    /// Latitude in signed degrees, bits `[48..72)`
    ///
    /// The wire value is a two's-complement count of
    /// 180/2^24 degree steps.
    pub fn latitude(&self) -> f64 {
        self.envelope.bits().signed(48..72) as f64 * LATITUDE_SCALE
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        vec![Identifier::new(
            IdentifierValue::Location {
                latitude: self.latitude(),
                longitude: self.longitude(),
            },
            Role::Any,
            self.envelope.origin(),
        )]
    }
}

/// End of transmission
///
/// Carries the parties of the call being torn down plus channel
/// housekeeping flags.
#[derive(Clone, Debug, PartialEq)]
pub struct TerminatorData {
    envelope: Envelope,
}

impl TerminatorData {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::TerminatorData(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Destination address, bits `[16..40)`
    ///
    /// A talkgroup or an individual radio depending on
    /// [`is_group_destination()`](Self::is_group_destination).
    pub fn destination(&self) -> u32 {
        self.envelope.bits().bits(16..40)
    }

    /// Transmitting radio, bits `[40..64)`
    pub fn source_radio(&self) -> u32 {
        self.envelope.bits().bits(40..64)
    }

    /// Set when the destination is a talkgroup, bit 64
    pub fn is_group_destination(&self) -> bool {
        self.envelope.bits().get(64)
    }

    /// Acknowledgement requested, bit 65
    pub fn response_requested(&self) -> bool {
        self.envelope.bits().get(65)
    }

    /// Full-message flag, bit 66
    pub fn full_message(&self) -> bool {
        self.envelope.bits().get(66)
    }

    /// Resynchronize flag, bit 68
    pub fn resync(&self) -> bool {
        self.envelope.bits().get(68)
    }

    /// Sequence number, bits `[69..72)`
    pub fn sequence_number(&self) -> u8 {
        self.envelope.bits().bits(69..72) as u8
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        let destination = if self.is_group_destination() {
            IdentifierValue::Talkgroup(self.destination())
        } else {
            IdentifierValue::Radio(self.destination())
        };
        vec![
            Identifier::new(destination, Role::To, self.envelope.origin()),
            Identifier::new(
                IdentifierValue::Radio(self.source_radio()),
                Role::From,
                self.envelope.origin(),
            ),
        ]
    }
}

/// Encryption parameters for a protected call
///
/// Only carried by full-length control words; the destination
/// group field runs past the end of a link control payload.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionParameters {
    envelope: Envelope,
}

impl EncryptionParameters {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        if envelope.bits().len() < 80 {
            return Unknown::decode(envelope);
        }
        Message::EncryptionParameters(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Key number, bits `[16..24)`
    pub fn key_id(&self) -> u8 {
        self.envelope.bits().bits(16..24) as u8
    }

    /// Initialization vector, bits `[24..56)` as 8 hex nibbles
    pub fn initialization_vector(&self) -> String {
        self.envelope.bits().hex(24..56)
    }

    /// Addressed talkgroup, bits `[56..80)`
    pub fn destination_group(&self) -> u32 {
        self.envelope.bits().bits(56..80)
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        vec![
            Identifier::new(
                IdentifierValue::Talkgroup(self.destination_group()),
                Role::To,
                self.envelope.origin(),
            ),
            Identifier::new(
                IdentifierValue::KeyId(self.key_id()),
                Role::Any,
                self.envelope.origin(),
            ),
        ]
    }
}

/// A single-fragment traffic burst
///
/// Short signalling that fits in one traffic burst. The envelope
/// holds the full 48-bit burst; the payload is not structured
/// like the full-length words and carries no opcode.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortBurst {
    envelope: Envelope,
}

impl ShortBurst {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::ShortBurst(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Channel color code, bits `[0..4)`
    pub fn color_code(&self) -> u8 {
        self.envelope.bits().bits(0..4) as u8
    }

    /// The 32-bit payload, bits `[16..48)`
    pub fn payload(&self) -> u32 {
        self.envelope.bits().bits(16..48)
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

/// A word with an unrecognized opcode or vendor
///
/// The raw bits are preserved so callers can inspect signalling
/// this crate does not interpret.
#[derive(Clone, Debug, PartialEq)]
pub struct Unknown {
    envelope: Envelope,
}

impl Unknown {
    pub(crate) fn decode(envelope: Envelope) -> Message {
        Message::Unknown(Self { envelope })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Opcode, bits `[2..8)`
    pub fn opcode(&self) -> u8 {
        self.envelope.opcode()
    }

    /// Vendor code, bits `[8..16)`
    pub fn vendor(&self) -> u8 {
        self.envelope.vendor()
    }

    pub(crate) fn identifiers(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    fn link_control(hex: &str) -> Envelope {
        Envelope::new(BitVector::from_hex(hex).unwrap(), 1000, 0, Origin::LinkControl)
    }

    #[test]
    fn test_envelope_validity() {
        let envelope = link_control("0000800007D16AD03B");
        assert!(envelope.is_valid());
        assert_eq!(0, envelope.corrected_count());

        let mut damaged = BitVector::from_hex("0000800007D16AD03B").unwrap();
        damaged.set_corrected_count(-1);
        let envelope = Envelope::new(damaged, 1000, 1, Origin::LinkControl);
        assert!(!envelope.is_valid());
        assert_eq!(1, envelope.timeslot());
    }

    #[test]
    fn test_group_voice_fields() {
        let envelope = link_control("0000800007D16AD03B");
        assert_eq!(0, envelope.opcode());
        assert_eq!(0, envelope.vendor());

        let message = GroupVoice::decode(envelope);
        let voice = match message {
            Message::GroupVoice(voice) => voice,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(2001, voice.talkgroup());
        assert_eq!(7000123, voice.source_radio());
        assert!(voice.service_options().is_emergency());
        assert!(!voice.service_options().is_encrypted());
        assert_eq!(0, voice.service_options().priority());

        let ids = voice.identifiers();
        assert_eq!(2, ids.len());
        assert_eq!(
            &IdentifierValue::Talkgroup(2001),
            ids[0].value()
        );
        assert_eq!(Role::To, ids[0].role());
        assert_eq!(&IdentifierValue::Radio(7000123), ids[1].value());
        assert_eq!(Role::From, ids[1].role());
        assert_eq!(Origin::LinkControl, ids[1].origin());
    }

    #[test]
    fn test_unit_to_unit_fields() {
        let envelope = link_control("03000012D68700D431");
        assert_eq!(3, envelope.opcode());

        let voice = match UnitToUnitVoice::decode(envelope) {
            Message::UnitToUnitVoice(voice) => voice,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(1234567, voice.destination_radio());
        assert_eq!(54321, voice.source_radio());
        assert_eq!(Role::To, voice.identifiers()[0].role());
    }

    #[test]
    fn test_gps_position() {
        let envelope = link_control("08000F8A177E3903C2");
        assert_eq!(8, envelope.opcode());

        let gps = match GpsInfo::decode(envelope) {
            Message::GpsInfo(gps) => gps,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(PositionError::Unknown, gps.position_error());
        assert_approx_eq!(-41.452113, gps.longitude(), 1.0e-5);
        assert_approx_eq!(40.088446, gps.latitude(), 1.0e-5);

        let ids = gps.identifiers();
        assert_eq!(1, ids.len());
        assert_eq!(Role::Any, ids[0].role());
    }

    #[test]
    fn test_terminator_fields() {
        let envelope = link_control("10000007D16AD03BA5");
        assert_eq!(16, envelope.opcode());

        let term = match TerminatorData::decode(envelope) {
            Message::TerminatorData(term) => term,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(2001, term.destination());
        assert_eq!(7000123, term.source_radio());
        assert!(term.is_group_destination());
        assert!(!term.response_requested());
        assert!(term.full_message());
        assert!(!term.resync());
        assert_eq!(5, term.sequence_number());
        assert_eq!(
            &IdentifierValue::Talkgroup(2001),
            term.identifiers()[0].value()
        );
    }

    #[test]
    fn test_terminator_individual_destination() {
        // bit 64 clear: the destination is a radio
        let envelope = link_control("10000007D16AD03B25");
        let term = match TerminatorData::decode(envelope) {
            Message::TerminatorData(term) => term,
            other => panic!("wrong variant: {:?}", other),
        };
        assert!(!term.is_group_destination());
        assert_eq!(&IdentifierValue::Radio(2001), term.identifiers()[0].value());
    }

    #[test]
    fn test_encryption_parameters() {
        let bits = BitVector::from_hex("201009DEADBEEF0007D10000").unwrap();
        let envelope = Envelope::new(bits, 1000, 0, Origin::ControlWord);
        assert_eq!(32, envelope.opcode());
        assert_eq!(16, envelope.vendor());

        let params = match EncryptionParameters::decode(envelope) {
            Message::EncryptionParameters(params) => params,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(9, params.key_id());
        assert_eq!("DEADBEEF", params.initialization_vector());
        assert_eq!(2001, params.destination_group());
        assert_eq!(
            &IdentifierValue::KeyId(9),
            params.identifiers()[1].value()
        );
    }

    #[test]
    fn test_encryption_needs_control_length() {
        // a link control payload is too short for the destination
        // group field and falls back to the unknown variant
        let envelope = link_control("201009DEADBEEF0007");
        assert!(matches!(
            EncryptionParameters::decode(envelope),
            Message::Unknown(_)
        ));
    }

    #[test]
    fn test_alias_header_fields() {
        let envelope = link_control("04009D0000000000FF");
        let header = match TalkerAliasHeader::decode(envelope) {
            Message::TalkerAliasHeader(header) => header,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(AliasFormat::Utf8, header.format());
        assert_eq!(14, header.character_count());
        assert!(header.identifiers().is_empty());
    }

    #[test]
    fn test_alias_block_index() {
        for (opcode, expected) in [(0x05u8, 1u8), (0x06, 2), (0x07, 3)] {
            let hex = format!("{:02X}0000000000000000", opcode);
            let envelope = link_control(&hex);
            let block = match TalkerAliasBlock::decode(envelope) {
                Message::TalkerAliasBlock(block) => block,
                other => panic!("wrong variant: {:?}", other),
            };
            assert_eq!(expected, block.block_index());
        }
    }

    #[test]
    fn test_short_burst_fields() {
        let bits = BitVector::from_hex("B000CAFEBABE").unwrap();
        let envelope = Envelope::new(bits, 1000, 1, Origin::LinkControl);
        let burst = match ShortBurst::decode(envelope) {
            Message::ShortBurst(burst) => burst,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(11, burst.color_code());
        assert_eq!(0xCAFEBABE, burst.payload());
        assert!(burst.identifiers().is_empty());
    }

    #[test]
    fn test_unknown_preserves_word() {
        let envelope = link_control("3F123456789ABCDEF0");
        let unknown = match Unknown::decode(envelope) {
            Message::Unknown(unknown) => unknown,
            other => panic!("wrong variant: {:?}", other),
        };
        assert_eq!(0x3F, unknown.opcode());
        assert_eq!(0x12, unknown.vendor());
        assert_eq!(72, unknown.envelope().bits().len());
    }
}
