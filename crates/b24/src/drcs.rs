//! DRCS glyph registry and bitmap hashing.
//!
//! Broadcasters ship custom glyphs as packed bitmaps inside dedicated
//! data units. Glyphs registered in one segment stay available for the
//! rest of the decoding session because later statements legally
//! reference them.

use std::collections::HashMap;

use md5::{Digest, Md5};
use tracing::trace;

use crate::error::{B24Error, Result};
use crate::token::Token;

/// One registered glyph bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrcsGlyph {
    pub width: u8,
    pub height: u8,
    /// Number of gradation levels (2 for plain on/off patterns).
    pub depth: u8,
    /// Row-major packed pattern, `ceil(width*height*depth_bits/8)` bytes.
    pub bitmap: Vec<u8>,
}

impl DrcsGlyph {
    /// Content hash of the packed pattern, used by the replacement
    /// pre-pass. Deterministic for identical bitmaps.
    pub fn digest(&self) -> String {
        hex::encode(Md5::digest(&self.bitmap))
    }
}

/// Bits per pixel for a gradation depth: `ceil(log2(depth))`.
fn depth_bits(depth: u32) -> u32 {
    u32::BITS - (depth - 1).leading_zeros()
}

/// Registry of glyphs keyed by DRCS set identity (0 = two-byte DRCS-0,
/// 1..=15 = one-byte sets) and character code.
#[derive(Debug, Default)]
pub struct DrcsRegistry {
    glyphs: HashMap<(u8, u16), DrcsGlyph>,
}

impl DrcsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Looks up a glyph. A miss is an ordinary broadcast ordering
    /// artifact, not an error.
    pub fn lookup(&self, set: u8, code: u16) -> Option<&DrcsGlyph> {
        self.glyphs.get(&(set, code))
    }

    /// Parses one DRCS data unit and registers every plain-raster font
    /// record it carries.
    ///
    /// Record format: 1-byte code count; per code a 2-byte big-endian
    /// character code and 1-byte font count; per font a mode byte
    /// (font-id << 4 | mode), a depth byte storing `depth - 2`, width,
    /// height, then the packed bitmap.
    pub fn process_unit(&mut self, byte_width: u8, data: &[u8]) -> Result<()> {
        B24Error::check_len(data, 1)?;
        let code_count = data[0] as usize;
        let mut pos = 1;

        for _ in 0..code_count {
            B24Error::check_len(data, pos + 3)?;
            let code = u16::from_be_bytes([data[pos], data[pos + 1]]);
            let font_count = data[pos + 2] as usize;
            pos += 3;

            for _ in 0..font_count {
                B24Error::check_len(data, pos + 4)?;
                let mode = data[pos] & 0x0F;
                let depth = data[pos + 1] as u32 + 2;
                let width = data[pos + 2];
                let height = data[pos + 3];
                pos += 4;

                let bits = width as usize * height as usize * depth_bits(depth) as usize;
                let len = bits.div_ceil(8);
                B24Error::check_len(data, pos + len)?;
                let bitmap = data[pos..pos + len].to_vec();
                pos += len;

                // Modes other than the plain raster patterns (compressed
                // or geometric) are skipped, not errored.
                if mode > 1 {
                    trace!(mode, "skipping non-raster DRCS font record");
                    continue;
                }

                let Some(key) = registry_key(byte_width, code) else {
                    trace!(code, byte_width, "DRCS character code outside set range");
                    continue;
                };
                self.glyphs.insert(
                    key,
                    DrcsGlyph {
                        width,
                        height,
                        depth: depth as u8,
                        bitmap,
                    },
                );
            }
        }
        Ok(())
    }
}

/// Maps a raw DRCS character code to its registry key.
///
/// One-byte units carry the owning set in the code's high byte
/// (0x41..=0x4F selects DRCS-1..15); two-byte units always target
/// DRCS-0 with a masked row/cell pair.
fn registry_key(byte_width: u8, code: u16) -> Option<(u8, u16)> {
    match byte_width {
        1 => {
            let set = (code >> 8) as u8;
            if !(0x41..=0x4F).contains(&set) {
                return None;
            }
            Some((set - 0x40, code & 0x007F))
        }
        2 => Some((0, code & 0x7F7F)),
        _ => None,
    }
}

/// Replaces DRCS tokens whose bitmap digest appears in `replacement`
/// with plain character tokens. Run before parsing, never during.
pub fn replace_drcs(tokens: &mut [Token], replacement: &HashMap<String, String>) {
    if replacement.is_empty() {
        return;
    }
    for token in tokens.iter_mut() {
        if let Token::Drcs(glyph) = token
            && let Some(text) = replacement.get(&glyph.digest())
        {
            *token = Token::character(text.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_byte_unit() -> Vec<u8> {
        vec![
            0x01, // one code
            0x41, 0x21, // DRCS-1, character 0x21
            0x01, // one font
            0x00, // font id 0, mode 0
            0x00, // depth - 2 = 0 (two levels, one bit per dot)
            0x02, 0x02, // 2x2 dots -> ceil(4/8) = 1 byte
            0b1010_0000,
        ]
    }

    #[test]
    fn test_process_one_byte_unit() {
        let mut registry = DrcsRegistry::new();
        registry.process_unit(1, &one_byte_unit()).unwrap();

        let glyph = registry.lookup(1, 0x21).expect("glyph registered");
        assert_eq!((glyph.width, glyph.height, glyph.depth), (2, 2, 2));
        assert_eq!(glyph.bitmap, vec![0b1010_0000]);
        assert!(registry.lookup(1, 0x22).is_none());
    }

    #[test]
    fn test_process_two_byte_unit() {
        let data = vec![
            0x01, 0x21, 0x21, // DRCS-0 row/cell
            0x01, 0x00, 0x02, // depth - 2 = 2 -> four levels, two bits
            0x02, 0x02, // 2x2 dots * 2 bits -> 1 byte
            0xFF,
        ];
        let mut registry = DrcsRegistry::new();
        registry.process_unit(2, &data).unwrap();
        let glyph = registry.lookup(0, 0x2121).expect("glyph registered");
        assert_eq!(glyph.depth, 4);
    }

    #[test]
    fn test_non_raster_mode_skipped() {
        let mut data = one_byte_unit();
        data[4] = 0x02; // compressed mode
        let mut registry = DrcsRegistry::new();
        registry.process_unit(1, &data).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_truncated_bitmap_is_error() {
        let mut data = one_byte_unit();
        data.pop();
        let mut registry = DrcsRegistry::new();
        let err = registry.process_unit(1, &data).unwrap_err();
        assert!(matches!(err, B24Error::InsufficientData { .. }));
    }

    #[test]
    fn test_depth_bits() {
        assert_eq!(depth_bits(2), 1);
        assert_eq!(depth_bits(3), 2);
        assert_eq!(depth_bits(4), 2);
        assert_eq!(depth_bits(16), 4);
    }

    #[test]
    fn test_digest_deterministic() {
        let mut registry = DrcsRegistry::new();
        registry.process_unit(1, &one_byte_unit()).unwrap();
        let a = registry.lookup(1, 0x21).unwrap().digest();
        let b = registry.lookup(1, 0x21).unwrap().digest();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_replace_drcs_substitutes_matching_glyphs() {
        let mut registry = DrcsRegistry::new();
        registry.process_unit(1, &one_byte_unit()).unwrap();
        let glyph = registry.lookup(1, 0x21).unwrap().clone();

        let mut replacement = HashMap::new();
        replacement.insert(glyph.digest(), "外".to_string());

        let mut tokens = vec![Token::Drcs(glyph.clone()), Token::Null];
        replace_drcs(&mut tokens, &replacement);
        assert_eq!(
            tokens[0],
            Token::Character {
                text: "外".to_string(),
                non_spacing: false
            }
        );
        assert_eq!(tokens[1], Token::Null);

        // A digest not present in the table leaves the token alone.
        let mut other = vec![Token::Drcs(DrcsGlyph {
            width: 2,
            height: 2,
            depth: 2,
            bitmap: vec![0x0F],
        })];
        replace_drcs(&mut other, &replacement);
        assert!(matches!(other[0], Token::Drcs(_)));
    }
}
