pub mod cmap;

/// Represents the platform identifier of an encoding record.
/// For more information, see the [OpenType platform IDs](https://learn.microsoft.com/en-us/typography/opentype/spec/name#platform-ids)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    /// ISO 10646, deprecated
    Iso,
    Windows,
    Custom,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Iso,
            3 => Self::Windows,
            4 => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

/// Encoding identifiers defined for the Windows platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsEncodingId {
    Symbol,
    /// Unicode BMP only
    UnicodeBmp,
    ShiftJis,
    Prc,
    Big5,
    Wansung,
    Johab,
    /// Unicode full repertoire, paired with format 12 subtables
    UnicodeFullRepertoire,
    Unknown(u16),
}

impl From<u16> for WindowsEncodingId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Symbol,
            1 => Self::UnicodeBmp,
            2 => Self::ShiftJis,
            3 => Self::Prc,
            4 => Self::Big5,
            5 => Self::Wansung,
            6 => Self::Johab,
            10 => Self::UnicodeFullRepertoire,
            _ => Self::Unknown(value),
        }
    }
}
