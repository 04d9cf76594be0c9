//! Talker alias collection and character decoding
//!
//! A transmitting radio may send a free-text alias alongside its
//! voice traffic. The alias is declared by a header word carrying
//! the character format and length, with up to three continuation
//! blocks supplying the remaining bits. The [`AliasAssembler`]
//! collects the parts per timeslot and emits one assembled
//! [`Message::TalkerAlias`] once everything the header declared
//! has arrived.
//!
//! Headers restart collection: a new header discards any parts
//! still waiting in that timeslot, so a transmission whose tail
//! was lost cannot leak characters into the next one.

use strum_macros::Display;
use thiserror::Error;

use crate::bits::BitVector;
use crate::protocol;

use super::identifier::Origin;
use super::lc::{Envelope, TalkerAlias, TalkerAliasBlock, TalkerAliasHeader};
use super::Message;

/// Most alias bits a header plus three blocks can carry
///
/// 49 bits ride in the header and 56 in each block. Declared
/// lengths beyond this are capped rather than rejected.
const ALIAS_BITS_MAX: usize = 217;

/// Where each continuation block's payload lands in the
/// reassembly buffer
const BLOCK_OFFSETS: [usize; 3] = [49, 105, 161];

/// Character encoding declared by the alias header, bits `[16..18)`
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum AliasFormat {
    /// Seven bits per character, ASCII
    #[strum(serialize = "7-bit")]
    SevenBit = 0,

    /// Eight bits per character, Latin-1
    #[strum(serialize = "8-bit")]
    EightBit = 1,

    /// Variable-width UTF-8; the declared count is in octets
    #[strum(serialize = "UTF-8")]
    Utf8 = 2,

    /// UTF-16, big-endian code units
    #[strum(serialize = "UTF-16")]
    Utf16 = 3,
}

impl AliasFormat {
    /// Bits consumed from the reassembly buffer per declared
    /// character
    pub fn bits_per_character(&self) -> usize {
        match self {
            AliasFormat::SevenBit => 7,
            AliasFormat::EightBit => 8,
            AliasFormat::Utf8 => 8,
            AliasFormat::Utf16 => 16,
        }
    }
}

impl From<u32> for AliasFormat {
    fn from(value: u32) -> Self {
        match value {
            0 => AliasFormat::SevenBit,
            1 => AliasFormat::EightBit,
            2 => AliasFormat::Utf8,
            _ => AliasFormat::Utf16,
        }
    }
}

/// Character decoding failure
///
/// The multi-byte formats can arrive damaged in ways the error
/// correction does not catch. Failures are mapped to an empty
/// alias string rather than suppressing the message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
enum AliasError {
    #[error("alias bits are not valid UTF-8")]
    InvalidUtf8,

    #[error("alias bits are not valid UTF-16")]
    InvalidUtf16,
}

/// Continuation blocks needed beyond the header for an alias of
/// `total_bits` bits
fn blocks_required(total_bits: usize) -> usize {
    match total_bits {
        0..=49 => 0,
        50..=105 => 1,
        106..=161 => 2,
        _ => 3,
    }
}

/// Parts collected so far for one timeslot
#[derive(Clone, Debug, Default)]
struct Slot {
    header: Option<TalkerAliasHeader>,
    blocks: [Option<TalkerAliasBlock>; 3],
}

/// Collects alias headers and blocks into complete aliases
///
/// Feed every decoded message to [`process()`](Self::process).
/// Alias parts are retained per timeslot; all other messages are
/// ignored. When the parts the header declared are all present,
/// one assembled [`Message::TalkerAlias`] is returned and the
/// timeslot's collection starts over.
///
/// Only parts that survived error correction participate. A
/// damaged block is simply not stored; its repeat in a later
/// superframe can still complete the alias.
#[derive(Clone, Debug)]
pub struct AliasAssembler {
    slots: [Slot; protocol::TIMESLOTS],
}

impl AliasAssembler {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Offer a decoded message to the assembler
    ///
    /// Returns the assembled alias when `message` is the last
    /// missing part, and `None` otherwise.
    pub fn process(&mut self, message: &Message) -> Option<Message> {
        match message {
            Message::TalkerAliasHeader(header) if header.envelope().is_valid() => {
                let timeslot = header.envelope().timeslot();
                let timestamp = header.envelope().timestamp();
                let slot = self.slot_mut(timeslot);
                *slot = Slot::default();
                slot.header = Some(header.clone());
                self.try_assemble(timeslot, timestamp)
            }
            Message::TalkerAliasBlock(block) if block.envelope().is_valid() => {
                let timeslot = block.envelope().timeslot();
                let timestamp = block.envelope().timestamp();
                let index = usize::from(block.block_index()) - 1;
                let slot = self.slot_mut(timeslot);
                slot.blocks[index] = Some(block.clone());
                self.try_assemble(timeslot, timestamp)
            }
            _ => None,
        }
    }

    /// Discard any partial collection for `timeslot`
    ///
    /// Called when carrier is lost. Safe to call repeatedly.
    pub fn reset(&mut self, timeslot: u8) {
        *self.slot_mut(timeslot) = Slot::default();
    }

    fn slot_mut(&mut self, timeslot: u8) -> &mut Slot {
        &mut self.slots[usize::from(timeslot) % protocol::TIMESLOTS]
    }

    /// Emit the alias if everything the header declared is present
    ///
    /// The timestamp of the completing part is carried on the
    /// assembled message.
    fn try_assemble(&mut self, timeslot: u8, timestamp: u64) -> Option<Message> {
        let slot = self.slot_mut(timeslot);
        let header = slot.header.as_ref()?;
        let format = header.format();
        let total_bits = (format.bits_per_character() * usize::from(header.character_count()))
            .min(ALIAS_BITS_MAX);
        if total_bits == 0 {
            *slot = Slot::default();
            return None;
        }
        for block in slot.blocks.iter().take(blocks_required(total_bits)) {
            block.as_ref()?;
        }

        let mut buffer = BitVector::new(ALIAS_BITS_MAX);
        buffer.copy_from(0, header.envelope().bits(), 23..72);
        for (offset, block) in BLOCK_OFFSETS.iter().zip(slot.blocks.iter()) {
            if let Some(block) = block {
                buffer.copy_from(*offset, block.envelope().bits(), 16..72);
            }
        }

        let characters = total_bits / format.bits_per_character();
        let alias = decode_alias(&buffer, format, characters).unwrap_or_default();
        *slot = Slot::default();

        let envelope = Envelope::new(buffer, timestamp, timeslot, Origin::AliasAssembly);
        Some(Message::TalkerAlias(TalkerAlias::new(
            envelope, alias, format,
        )))
    }
}

impl Default for AliasAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode `characters` characters from the front of `buffer`
///
/// Trailing NUL and space padding is stripped. The fixed-width
/// formats cannot fail; 8-bit characters are taken as Latin-1.
fn decode_alias(
    buffer: &BitVector,
    format: AliasFormat,
    characters: usize,
) -> Result<String, AliasError> {
    let width = format.bits_per_character();
    let alias = match format {
        AliasFormat::SevenBit | AliasFormat::EightBit => (0..characters)
            .map(|chr| char::from(buffer.bits(chr * width..(chr + 1) * width) as u8))
            .collect(),
        AliasFormat::Utf8 => {
            let octets: Vec<u8> = (0..characters)
                .map(|chr| buffer.bits(chr * 8..chr * 8 + 8) as u8)
                .collect();
            String::from_utf8(octets).map_err(|_| AliasError::InvalidUtf8)?
        }
        AliasFormat::Utf16 => {
            let units: Vec<u16> = (0..characters)
                .map(|chr| buffer.bits(chr * 16..chr * 16 + 16) as u16)
                .collect();
            String::from_utf16(&units).map_err(|_| AliasError::InvalidUtf16)?
        }
    };
    Ok(alias.trim_end_matches(&['\0', ' '][..]).to_string())
}
