/// ECHONET Lite service codes.
///
/// Requests live in `0x60..=0x6F`, responses and notifications in
/// `0x70..=0x7F`, and "service not available" replies in `0x50..=0x5F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Esv {
    SetI,
    SetC,
    Get,
    InfReq,
    SetGet,
    SetRes,
    GetRes,
    Inf,
    InfC,
    InfCRes,
    SetGetRes,
    SetISna,
    SetCSna,
    GetSna,
    InfSna,
    SetGetSna,
}

impl Esv {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::SetI => 0x60,
            Self::SetC => 0x61,
            Self::Get => 0x62,
            Self::InfReq => 0x63,
            Self::SetGet => 0x6E,
            Self::SetRes => 0x71,
            Self::GetRes => 0x72,
            Self::Inf => 0x73,
            Self::InfC => 0x74,
            Self::InfCRes => 0x7A,
            Self::SetGetRes => 0x7E,
            Self::SetISna => 0x50,
            Self::SetCSna => 0x51,
            Self::GetSna => 0x52,
            Self::InfSna => 0x53,
            Self::SetGetSna => 0x5E,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x60 => Self::SetI,
            0x61 => Self::SetC,
            0x62 => Self::Get,
            0x63 => Self::InfReq,
            0x6E => Self::SetGet,
            0x71 => Self::SetRes,
            0x72 => Self::GetRes,
            0x73 => Self::Inf,
            0x74 => Self::InfC,
            0x7A => Self::InfCRes,
            0x7E => Self::SetGetRes,
            0x50 => Self::SetISna,
            0x51 => Self::SetCSna,
            0x52 => Self::GetSna,
            0x53 => Self::InfSna,
            0x5E => Self::SetGetSna,
            _ => return None,
        })
    }

    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::SetI | Self::SetC | Self::Get | Self::InfReq | Self::SetGet | Self::InfC
        )
    }

    /// "Service not available" replies: the target answered but could not
    /// serve every requested property.
    pub const fn is_not_available(self) -> bool {
        matches!(
            self,
            Self::SetISna | Self::SetCSna | Self::GetSna | Self::InfSna | Self::SetGetSna
        )
    }

    /// Whether frames with this code carry the second (get) property list.
    pub const fn has_get_list(self) -> bool {
        matches!(self, Self::SetGet | Self::SetGetRes | Self::SetGetSna)
    }

    /// Whether a frame with code `reply` answers a request with this code.
    pub const fn accepts_reply(self, reply: Esv) -> bool {
        match self {
            Self::SetI => matches!(reply, Self::SetISna),
            Self::SetC => matches!(reply, Self::SetRes | Self::SetCSna),
            Self::Get => matches!(reply, Self::GetRes | Self::GetSna),
            Self::InfReq => matches!(reply, Self::Inf | Self::InfSna),
            Self::SetGet => matches!(reply, Self::SetGetRes | Self::SetGetSna),
            Self::InfC => matches!(reply, Self::InfCRes),
            _ => false,
        }
    }
}
