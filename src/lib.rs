//! Resolves Unicode code points to glyph indices through the format 12
//! (segmented coverage) subtable of a font's `cmap` table.

pub mod buffer;
pub mod resolver;
pub mod tables;

pub use resolver::{FallbackResolver, GlyphIndexer, GlyphLookupResult, MISSING_GLYPH};
pub use tables::cmap::{
    CmapError, CoverageGroup, EncodingRecord, ParseOptions, ParsedCmap, parse_cmap,
    parse_cmap_with,
};
