use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::tables::cmap::{CmapError, CoverageGroup, ParseOptions, ParsedCmap, parse_cmap_with};

/// The value a 16-bit fallback conventionally returns for a glyph the font
/// does not have. It is passed through unchanged.
pub const MISSING_GLYPH: u16 = 0xFFFF;

/// A secondary glyph lookup used when the cmap has no group covering a
/// code point below `0x10000`.
///
/// Usually bound to the font the cmap was read from. Any locking the
/// underlying font backend needs is up to the implementation.
pub trait FallbackResolver {
    fn lookup_16bit(&self, code_unit: u16) -> u16;
}

impl<F> FallbackResolver for F
where
    F: Fn(u16) -> u16,
{
    fn lookup_16bit(&self, code_unit: u16) -> u16 {
        self(code_unit)
    }
}

/// The outcome of resolving a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphLookupResult {
    /// A coverage group maps the code point to this glyph.
    Mapped(u32),
    /// The fallback resolver's answer, possibly [`MISSING_GLYPH`].
    Fallback(u16),
    /// Nothing maps the code point.
    NotFound,
}

impl GlyphLookupResult {
    /// The numeric glyph index, with `0` standing for "not found".
    pub fn glyph_index(&self) -> u32 {
        match *self {
            Self::Mapped(id) => id,
            Self::Fallback(id) => u32::from(id),
            Self::NotFound => 0,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

impl ParsedCmap {
    /// Binary searches for the group covering `code_point`.
    ///
    /// Groups are assumed sorted by `start_char_code` and disjoint. Tables
    /// violating that can be rejected up front with
    /// [`ParseOptions::validate_group_order`]; otherwise the result for an
    /// unsorted table is unspecified (but never a panic).
    pub fn find_group(&self, code_point: u32) -> Option<&CoverageGroup> {
        let groups = self.groups();
        groups
            .binary_search_by(|group| {
                if code_point < group.start_char_code {
                    Ordering::Greater
                } else if code_point > group.end_char_code {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()
            .map(|index| &groups[index])
    }

    /// Looks up the glyph for `code_point` in the table only.
    pub fn lookup(&self, code_point: u32) -> Option<u32> {
        let group = self.find_group(code_point)?;
        let glyph = group.glyph_index(code_point);

        if glyph.is_none() {
            warn!(code_point, ?group, "glyph index overflows u32");
        }

        glyph
    }

    /// Resolves `code_point` against the table without any fallback.
    pub fn resolve(&self, code_point: u32) -> GlyphLookupResult {
        match self.lookup(code_point) {
            Some(glyph) => GlyphLookupResult::Mapped(glyph),
            None => GlyphLookupResult::NotFound,
        }
    }

    /// Resolves `code_point`, asking `fallback` when the table has no mapping
    /// and the code point fits in 16 bits.
    pub fn resolve_with<F>(&self, code_point: u32, fallback: &F) -> GlyphLookupResult
    where
        F: FallbackResolver + ?Sized,
    {
        if let Some(glyph) = self.lookup(code_point) {
            return GlyphLookupResult::Mapped(glyph);
        }

        match u16::try_from(code_point) {
            Ok(code_unit) => {
                let glyph = fallback.lookup_16bit(code_unit);
                trace!(code_point, glyph, "resolved through fallback");
                GlyphLookupResult::Fallback(glyph)
            }
            Err(_) => GlyphLookupResult::NotFound,
        }
    }
}

/// A glyph lookup session: the parsed cmap of a font together with the
/// font's own 16-bit lookup.
///
/// # Examples
///
/// ```
/// use glyph_index::{GlyphIndexer, MISSING_GLYPH};
///
/// let table: &[u8] = &[
///     0, 0, 0, 1,
///     0, 3, 0, 10, 0, 0, 0, 12,
///     0, 12, 0, 0, 0, 0, 0, 28, 0, 0, 0, 0, 0, 0, 0, 1,
///     0, 0, 0x22, 0x00, 0, 0, 0x22, 0xFF, 0, 0, 0x01, 0xF4,
/// ];
///
/// let indexer = GlyphIndexer::new(table, |_: u16| MISSING_GLYPH).unwrap();
/// assert_eq!(indexer.glyph_index(0x2211), 517);
/// assert_eq!(indexer.glyph_index(0x41), u32::from(MISSING_GLYPH));
/// assert_eq!(indexer.glyph_index(0x1F600), 0);
/// ```
#[derive(Debug)]
pub struct GlyphIndexer<F> {
    cmap: ParsedCmap,
    fallback: F,
}

impl<F: FallbackResolver> GlyphIndexer<F> {
    /// Parses `bytes` as a cmap table and binds it to `fallback`.
    pub fn new(bytes: &[u8], fallback: F) -> Result<Self, CmapError> {
        Self::with_options(bytes, fallback, &ParseOptions::default())
    }

    pub fn with_options(bytes: &[u8], fallback: F, options: &ParseOptions) -> Result<Self, CmapError> {
        Ok(Self::from_parsed(parse_cmap_with(bytes, options)?, fallback))
    }

    /// Binds an already parsed table.
    pub fn from_parsed(cmap: ParsedCmap, fallback: F) -> Self {
        Self { cmap, fallback }
    }

    pub fn resolve(&self, code_point: u32) -> GlyphLookupResult {
        self.cmap.resolve_with(code_point, &self.fallback)
    }

    /// Glyph index of `code_point`, `0` when nothing maps it.
    pub fn glyph_index(&self, code_point: u32) -> u32 {
        self.resolve(code_point).glyph_index()
    }

    pub fn cmap(&self) -> &ParsedCmap {
        &self.cmap
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn table(groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut out = vec![0, 0, 0, 1, 0, 3, 0, 10, 0, 0, 0, 12];
        out.extend_from_slice(&12u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(16 + 12 * groups.len() as u32).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(groups.len() as u32).to_be_bytes());
        for &(start, end, glyph) in groups {
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&end.to_be_bytes());
            out.extend_from_slice(&glyph.to_be_bytes());
        }
        out
    }

    #[test]
    fn binary_search_hits_every_group() {
        let cmap = crate::parse_cmap(&table(&[
            (0x10, 0x1F, 1),
            (0x30, 0x30, 20),
            (0x100, 0x1FF, 30),
            (0x2200, 0x22FF, 500),
            (0x1F600, 0x1F64F, 1000),
        ]))
        .unwrap();

        assert_eq!(cmap.lookup(0x10), Some(1));
        assert_eq!(cmap.lookup(0x1F), Some(16));
        assert_eq!(cmap.lookup(0x30), Some(20));
        assert_eq!(cmap.lookup(0x180), Some(30 + 0x80));
        assert_eq!(cmap.lookup(0x2211), Some(517));
        assert_eq!(cmap.lookup(0x1F64F), Some(1000 + 0x4F));

        assert_eq!(cmap.lookup(0x0F), None);
        assert_eq!(cmap.lookup(0x20), None);
        assert_eq!(cmap.lookup(0x1F650), None);
    }

    #[test]
    fn resolve_never_falls_back() {
        let cmap = crate::parse_cmap(&table(&[(0x41, 0x5A, 3)])).unwrap();

        assert_eq!(cmap.resolve(0x42), GlyphLookupResult::Mapped(4));
        assert_eq!(cmap.resolve(0x30), GlyphLookupResult::NotFound);
    }

    #[test]
    fn fallback_only_for_16_bit() {
        let cmap = crate::parse_cmap(&table(&[(0x41, 0x5A, 3)])).unwrap();
        let calls = Cell::new(0);
        let fallback = |unit: u16| {
            calls.set(calls.get() + 1);
            unit + 1
        };

        assert_eq!(
            cmap.resolve_with(0x30, &fallback),
            GlyphLookupResult::Fallback(0x31)
        );
        assert_eq!(calls.get(), 1);

        assert_eq!(cmap.resolve_with(0x10000, &fallback), GlyphLookupResult::NotFound);
        assert_eq!(cmap.resolve_with(0x41, &fallback), GlyphLookupResult::Mapped(3));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fallback_sentinel_passes_through() {
        let indexer = GlyphIndexer::new(&table(&[]), |_: u16| MISSING_GLYPH).unwrap();

        assert_eq!(indexer.resolve(0xFFFF), GlyphLookupResult::Fallback(MISSING_GLYPH));
        assert!(indexer.resolve(0xFFFF).is_found());
        assert_eq!(indexer.glyph_index(0x10FFFF), 0);
        assert!(indexer.cmap().is_empty());
    }

    #[test]
    fn overflowing_group_falls_back() {
        let cmap = crate::parse_cmap(&table(&[(0x41, 0x5A, u32::MAX)])).unwrap();

        assert_eq!(cmap.resolve(0x41), GlyphLookupResult::Mapped(u32::MAX));
        assert_eq!(cmap.resolve(0x42), GlyphLookupResult::NotFound);
        assert_eq!(
            cmap.resolve_with(0x42, &|_: u16| 7),
            GlyphLookupResult::Fallback(7)
        );
    }

    #[test]
    fn result_glyph_index() {
        assert_eq!(GlyphLookupResult::Mapped(70_000).glyph_index(), 70_000);
        assert_eq!(GlyphLookupResult::Fallback(12).glyph_index(), 12);
        assert_eq!(GlyphLookupResult::NotFound.glyph_index(), 0);
        assert!(!GlyphLookupResult::NotFound.is_found());
    }
}
