use tracing::{debug, warn};

use crate::buffer::{BufReader, BufReaderError};

use super::CmapError;

const FORMAT: u16 = 12;

/// format, reserved, length, language, numGroups
const HEADER_SIZE: usize = 16;

/// A range of consecutive code points mapped to consecutive glyph ids,
/// see [format 12](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageGroup {
    /// First code point in the group
    pub start_char_code: u32,

    /// Last code point in the group, inclusive
    pub end_char_code: u32,

    /// Glyph index of `start_char_code`
    pub start_glyph_id: u32,
}

impl CoverageGroup {
    /// Size of a group record in bytes.
    pub const SIZE: usize = 12;

    fn from_reader(reader: &mut BufReader<'_>) -> Result<Self, BufReaderError> {
        Ok(Self {
            start_char_code: reader.read_u32()?,
            end_char_code: reader.read_u32()?,
            start_glyph_id: reader.read_u32()?,
        })
    }

    pub fn contains(&self, code_point: u32) -> bool {
        code_point >= self.start_char_code && code_point <= self.end_char_code
    }

    /// The glyph for a code point inside this group.
    ///
    /// Returns `None` if the code point is outside the group or the glyph
    /// index does not fit in 32 bits.
    pub fn glyph_index(&self, code_point: u32) -> Option<u32> {
        if !self.contains(code_point) {
            return None;
        }

        self.start_glyph_id
            .checked_add(code_point - self.start_char_code)
    }
}

/// Decodes a format 12 subtable starting at the reader's cursor.
pub(super) fn parse_groups(reader: &mut BufReader<'_>) -> Result<Vec<CoverageGroup>, CmapError> {
    let start = reader.position();

    let format = reader.read_u16()?;
    if format != FORMAT {
        return Err(CmapError::UnsupportedSubtableFormat(format));
    }

    reader.skip(2); // reserved
    let length = reader.read_u32()?;
    let language = reader.read_u32()?;
    let num_groups = reader.read_u32()?;
    debug!(length, language, num_groups, offset = start, "format 12 subtable");

    // `length` is informational only, the group count drives decoding
    let expected = u64::from(num_groups) * CoverageGroup::SIZE as u64 + HEADER_SIZE as u64;
    if u64::from(length) != expected {
        warn!(length, expected, "format 12 length does not match group count");
    }

    // Make sure every record is present before allocating for them
    let records_len = usize::try_from(num_groups)
        .ok()
        .and_then(|n| n.checked_mul(CoverageGroup::SIZE))
        .unwrap_or(usize::MAX);
    reader.ensure(records_len)?;

    let count = usize::try_from(num_groups).map_err(|_| CmapError::AllocationFailure(num_groups))?;
    let mut groups = Vec::new();
    groups
        .try_reserve_exact(count)
        .map_err(|_| CmapError::AllocationFailure(num_groups))?;

    for _ in 0..count {
        groups.push(CoverageGroup::from_reader(reader)?);
    }

    Ok(groups)
}

/// Checks that groups are well formed, ascending and disjoint.
pub(super) fn check_group_order(groups: &[CoverageGroup]) -> Result<(), CmapError> {
    for (index, group) in groups.iter().enumerate() {
        if group.start_char_code > group.end_char_code {
            return Err(CmapError::UnsortedGroups { index });
        }

        if let Some(next) = groups.get(index + 1) {
            if group.end_char_code >= next.start_char_code {
                return Err(CmapError::UnsortedGroups { index: index + 1 });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtable(format: u16, length: u32, groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&format.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(groups.len() as u32).to_be_bytes());
        for &(start, end, glyph) in groups {
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&end.to_be_bytes());
            out.extend_from_slice(&glyph.to_be_bytes());
        }
        out
    }

    fn group(start_char_code: u32, end_char_code: u32, start_glyph_id: u32) -> CoverageGroup {
        CoverageGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }

    #[test]
    fn decodes_groups_in_order() {
        let data = subtable(12, 40, &[(0x20, 0x7E, 1), (0x1F600, 0x1F64F, 900)]);
        let mut reader = BufReader::from_buffer(&data);

        let groups = parse_groups(&mut reader).unwrap();
        assert_eq!(
            groups,
            vec![group(0x20, 0x7E, 1), group(0x1F600, 0x1F64F, 900)]
        );
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn length_is_not_enforced() {
        let data = subtable(12, 0xFFFF_FFFF, &[(0x41, 0x5A, 3)]);
        let mut reader = BufReader::from_buffer(&data);

        assert_eq!(parse_groups(&mut reader).unwrap().len(), 1);
    }

    #[test]
    fn rejects_other_formats() {
        let data = subtable(4, 16, &[]);
        let mut reader = BufReader::from_buffer(&data);

        assert_eq!(
            parse_groups(&mut reader),
            Err(CmapError::UnsupportedSubtableFormat(4))
        );
    }

    #[test]
    fn oversized_group_count_is_truncated() {
        let mut data = subtable(12, 16, &[]);
        data[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
        let mut reader = BufReader::from_buffer(&data);

        assert!(matches!(
            parse_groups(&mut reader),
            Err(CmapError::TruncatedData(_))
        ));
    }

    #[test]
    fn empty_subtable() {
        let data = subtable(12, 16, &[]);
        let mut reader = BufReader::from_buffer(&data);

        assert!(parse_groups(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn glyph_index_within_group() {
        let g = group(0x2200, 0x22FF, 500);

        assert_eq!(g.glyph_index(0x2200), Some(500));
        assert_eq!(g.glyph_index(0x2211), Some(517));
        assert_eq!(g.glyph_index(0x22FF), Some(755));
        assert_eq!(g.glyph_index(0x21FF), None);
        assert_eq!(g.glyph_index(0x2300), None);
    }

    #[test]
    fn glyph_index_overflow() {
        let g = group(0, 10, u32::MAX - 1);

        assert_eq!(g.glyph_index(1), Some(u32::MAX));
        assert_eq!(g.glyph_index(2), None);
    }

    #[test]
    fn group_order() {
        assert!(check_group_order(&[]).is_ok());
        assert!(check_group_order(&[group(1, 5, 0), group(6, 9, 0)]).is_ok());

        assert_eq!(
            check_group_order(&[group(1, 5, 0), group(5, 9, 0)]),
            Err(CmapError::UnsortedGroups { index: 1 })
        );
        assert_eq!(
            check_group_order(&[group(10, 20, 0), group(1, 5, 0)]),
            Err(CmapError::UnsortedGroups { index: 1 })
        );
        assert_eq!(
            check_group_order(&[group(1, 5, 0), group(9, 6, 0)]),
            Err(CmapError::UnsortedGroups { index: 1 })
        );
    }
}
