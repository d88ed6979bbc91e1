/// How an attribute's value is represented on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// UTF-8 text
    Text,
    /// 32-bit big-endian integer
    Integer,
    /// IPv4 address (4 bytes)
    Address,
    /// Opaque bytes
    Octets,
    /// User-Password, hidden per RFC 2865 Section 5.2
    HiddenPassword,
}

/// The RADIUS attributes this crate knows by name (RFC 2865)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    /// User-Name (1)
    UserName = 1,
    /// User-Password (2)
    UserPassword = 2,
    /// NAS-IP-Address (4)
    NasIpAddress = 4,
    /// Reply-Message (18)
    ReplyMessage = 18,
    /// State (24)
    State = 24,
    /// Class (25)
    Class = 25,
    /// Session-Timeout (27)
    SessionTimeout = 27,
    /// NAS-Identifier (32)
    NasIdentifier = 32,
}

impl AttributeType {
    const ALL: [AttributeType; 8] = [
        AttributeType::UserName,
        AttributeType::UserPassword,
        AttributeType::NasIpAddress,
        AttributeType::ReplyMessage,
        AttributeType::State,
        AttributeType::Class,
        AttributeType::SessionTimeout,
        AttributeType::NasIdentifier,
    ];

    /// Look up an attribute by its dictionary name, e.g. `"User-Name"`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeType::UserName => "User-Name",
            AttributeType::UserPassword => "User-Password",
            AttributeType::NasIpAddress => "NAS-IP-Address",
            AttributeType::ReplyMessage => "Reply-Message",
            AttributeType::State => "State",
            AttributeType::Class => "Class",
            AttributeType::SessionTimeout => "Session-Timeout",
            AttributeType::NasIdentifier => "NAS-Identifier",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            AttributeType::UserName
            | AttributeType::ReplyMessage
            | AttributeType::NasIdentifier => ValueKind::Text,
            AttributeType::UserPassword => ValueKind::HiddenPassword,
            AttributeType::NasIpAddress => ValueKind::Address,
            AttributeType::SessionTimeout => ValueKind::Integer,
            AttributeType::State | AttributeType::Class => ValueKind::Octets,
        }
    }
}
