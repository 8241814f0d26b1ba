use thiserror::Error;
use tracing::{debug, warn};

use crate::buffer::{BufReader, BufReaderError};

use super::{PlatformId, WindowsEncodingId};

mod format12;

pub use format12::CoverageGroup;

/// The only cmap header version defined by OpenType.
const SUPPORTED_VERSION: u16 = 0;

/// Represents the errors which may occur when parsing a
/// [cmap table](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap)
/// from a raw buffer. Every error aborts parsing; no partial table is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CmapError {
    #[error("Invalid version number: {0}. Expected value is 0")]
    UnsupportedVersion(u16),

    #[error("No encoding record for platform 3 (Windows), encoding 10 (Unicode full repertoire)")]
    SubtableNotFound,

    #[error("Invalid format number: {0}. Expected is 12")]
    UnsupportedSubtableFormat(u16),

    #[error(transparent)]
    TruncatedData(#[from] BufReaderError),

    #[error("Unable to allocate memory for {0} sequential map groups")]
    AllocationFailure(u32),

    /// Only reported when [`ParseOptions::validate_group_order`] is enabled.
    #[error("Sequential map group {index} is inverted, overlaps or is out of order")]
    UnsortedGroups { index: usize },
}

/// Knobs for [`parse_cmap_with`].
///
/// The default trusts the font, as the format mandates groups sorted by
/// `startCharCode` and non-overlapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    validate_group_order: bool,
}

impl ParseOptions {
    /// Reject tables whose groups are not strictly ascending and disjoint.
    pub fn validate_group_order(mut self, enabled: bool) -> Self {
        self.validate_group_order = enabled;
        self
    }

    pub fn validates_group_order(&self) -> bool {
        self.validate_group_order
    }
}

/// The cmap header: version and the number of encoding records that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmapHeader {
    /// The version of the cmap table, always zero
    pub version: u16,

    /// The number of encoding subtables
    pub num_tables: u16,
}

impl CmapHeader {
    /// Reads the 4-byte header at the reader's cursor.
    ///
    /// The version is checked before anything else is read.
    pub(crate) fn from_reader(reader: &mut BufReader<'_>) -> Result<Self, CmapError> {
        let version = reader.read_u16()?;
        if version != SUPPORTED_VERSION {
            return Err(CmapError::UnsupportedVersion(version));
        }

        let num_tables = reader.read_u16()?;

        Ok(Self {
            version,
            num_tables,
        })
    }
}

/// A single entry of the encoding record directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRecord {
    /// The platform identifier
    pub platform_id: PlatformId,

    /// The platform specific encoding identifier
    pub encoding_id: u16,

    /// Offset of the subtable from the beginning of the cmap table
    pub offset: u32,
}

impl EncodingRecord {
    /// Size of a record in bytes.
    pub const SIZE: usize = 8;

    pub(crate) fn from_reader(reader: &mut BufReader<'_>) -> Result<Self, CmapError> {
        Ok(Self {
            platform_id: PlatformId::from(reader.read_u16()?),
            encoding_id: reader.read_u16()?,
            offset: reader.read_u32()?,
        })
    }

    /// Whether this is the Windows / Unicode full repertoire encoding (3, 10).
    pub fn is_unicode_full_repertoire(&self) -> bool {
        self.platform_id == PlatformId::Windows
            && WindowsEncodingId::from(self.encoding_id)
                == WindowsEncodingId::UnicodeFullRepertoire
    }
}

/// Scans the encoding record directory and returns the subtable offset of the
/// first (3, 10) record.
fn find_full_repertoire_offset(reader: &mut BufReader<'_>) -> Result<u32, CmapError> {
    let header = CmapHeader::from_reader(reader)?;
    debug!(num_tables = header.num_tables, "cmap header");

    let mut selected: Option<EncodingRecord> = None;
    let mut found = 0usize;

    // Every record is decoded so a truncated directory never goes unnoticed
    for index in 0..header.num_tables {
        let record = EncodingRecord::from_reader(reader)?;

        if record.is_unicode_full_repertoire() {
            found += 1;
            if selected.is_none() {
                debug!(index, offset = record.offset, "selected encoding record");
                selected = Some(record);
            }
        }
    }

    if found > 1 {
        warn!(found, "multiple (3, 10) encoding records, using the first");
    }

    selected
        .map(|record| record.offset)
        .ok_or(CmapError::SubtableNotFound)
}

/// The coverage groups of a parsed format 12 subtable.
///
/// Owns its groups and holds no reference to the table bytes it came from.
/// Immutable once built, so it can be shared across threads for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCmap {
    groups: Vec<CoverageGroup>,
}

impl ParsedCmap {
    /// The groups in table order.
    pub fn groups(&self) -> &[CoverageGroup] {
        &self.groups
    }

    /// Number of groups, equal to the subtable's `numGroups`.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Calls `f` for each code point covered by the table, in table order.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for group in &self.groups {
            for code_point in group.start_char_code..=group.end_char_code {
                f(code_point);
            }
        }
    }
}

/// Parses a raw cmap table with the default [`ParseOptions`].
///
/// # Examples
///
/// ```
/// use glyph_index::{GlyphLookupResult, parse_cmap};
///
/// let table: &[u8] = &[
///     0, 0, 0, 1, // version 0, one encoding record
///     0, 3, 0, 10, 0, 0, 0, 12, // (3, 10) at offset 12
///     0, 12, 0, 0, 0, 0, 0, 28, 0, 0, 0, 0, 0, 0, 0, 1, // format 12, one group
///     0, 0, 0x22, 0x00, 0, 0, 0x22, 0xFF, 0, 0, 0x01, 0xF4, // U+2200..U+22FF -> 500
/// ];
///
/// let cmap = parse_cmap(table).unwrap();
/// assert_eq!(cmap.resolve(0x2211), GlyphLookupResult::Mapped(517));
/// ```
pub fn parse_cmap(bytes: &[u8]) -> Result<ParsedCmap, CmapError> {
    parse_cmap_with(bytes, &ParseOptions::default())
}

/// Parses a raw cmap table, selecting the (3, 10) encoding record and
/// decoding its format 12 subtable.
pub fn parse_cmap_with(bytes: &[u8], options: &ParseOptions) -> Result<ParsedCmap, CmapError> {
    let mut reader = BufReader::from_buffer(bytes);
    let offset = find_full_repertoire_offset(&mut reader)?;

    // The offset is relative to the start of the cmap table
    reader.seek_to(usize::try_from(offset).unwrap_or(usize::MAX));
    let groups = format12::parse_groups(&mut reader)?;

    if options.validate_group_order {
        format12::check_group_order(&groups)?;
    }

    Ok(ParsedCmap { groups })
}
