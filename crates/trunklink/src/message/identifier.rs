//! Typed identifiers extracted from messages
//!
//! Messages name the parties and resources of a transmission:
//! the talkgroup being called, the radio doing the calling, a
//! reported position, and so on. Each becomes an [`Identifier`]
//! with a [`Role`] describing its direction and an [`Origin`]
//! recording which signalling path produced it. Identifiers are
//! plain values; two messages may extract equal identifiers
//! without any connection between them.

use std::fmt;

use strum_macros::Display;

/// What an identifier refers to
#[derive(Clone, Debug, PartialEq)]
pub enum IdentifierValue {
    /// A talkgroup number
    Talkgroup(u32),

    /// An individual radio number
    Radio(u32),

    /// A geographic position, in signed degrees
    Location { latitude: f64, longitude: f64 },

    /// A transmitting radio's self-reported alias
    Alias(String),

    /// An encryption key number
    KeyId(u8),
}

impl fmt::Display for IdentifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Talkgroup(talkgroup) => write!(f, "talkgroup {}", talkgroup),
            Self::Radio(radio) => write!(f, "radio {}", radio),
            Self::Location {
                latitude,
                longitude,
            } => write!(f, "{:.5}, {:.5}", latitude, longitude),
            Self::Alias(alias) => write!(f, "\"{}\"", alias),
            Self::KeyId(key) => write!(f, "key {}", key),
        }
    }
}

/// Direction of an identifier within its transmission
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Role {
    /// The transmitting party
    From,

    /// The addressed party
    To,

    /// Not directional
    Any,
}

/// Signalling path that carried a message
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A CRC-protected control word
    ControlWord,

    /// Link control reassembled from traffic-channel fragments
    LinkControl,

    /// Assembled from a talker alias header and blocks
    AliasAssembly,
}

/// A typed identifier with its role
#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    value: IdentifierValue,
    role: Role,
    origin: Origin,
}

impl Identifier {
    pub(crate) fn new(value: IdentifierValue, role: Role, origin: Origin) -> Self {
        Self {
            value,
            role,
            origin,
        }
    }

    /// The identified value
    pub fn value(&self) -> &IdentifierValue {
        &self.value
    }

    /// Direction of this identifier
    pub fn role(&self) -> Role {
        self.role
    }

    /// Signalling path that produced this identifier
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Any => write!(f, "{}", self.value),
            role => write!(f, "{} ({})", self.value, role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = Identifier::new(
            IdentifierValue::Talkgroup(2001),
            Role::To,
            Origin::ControlWord,
        );
        assert_eq!("talkgroup 2001 (To)", id.to_string());

        let id = Identifier::new(
            IdentifierValue::Radio(7000123),
            Role::From,
            Origin::LinkControl,
        );
        assert_eq!("radio 7000123 (From)", id.to_string());

        let id = Identifier::new(
            IdentifierValue::Location {
                latitude: 40.1875,
                longitude: -75.25,
            },
            Role::Any,
            Origin::LinkControl,
        );
        assert_eq!("40.18750, -75.25000", id.to_string());

        let id = Identifier::new(
            IdentifierValue::Alias(String::from("MEDIC 7")),
            Role::From,
            Origin::AliasAssembly,
        );
        assert_eq!("\"MEDIC 7\" (From)", id.to_string());
    }
}
