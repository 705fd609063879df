//! Character dictionaries and decoding profiles.
//!
//! A profile fixes the initial designator bindings and whether the 16
//! predefined macro combinations exist; the scanning algorithm itself is
//! shared across profiles.

use tracing::trace;

/// One of the four logical designator slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Designator {
    G0 = 0,
    G1 = 1,
    G2 = 2,
    G3 = 3,
}

/// A dictionary that can be bound to a designator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicSet {
    /// JIS X 0208 kanji plane plus the ARIB additional-symbol rows.
    Kanji,
    Alnum,
    Hiragana,
    Katakana,
    MosaicA,
    MosaicB,
    MosaicC,
    MosaicD,
    PropAlnum,
    PropHiragana,
    PropKatakana,
    JisX0201Katakana,
    /// DRCS-0 (two-byte) through DRCS-15 (one-byte).
    Drcs(u8),
    Macro,
}

impl GraphicSet {
    /// Number of bytes composing one code point in this set.
    pub fn byte_width(self) -> usize {
        match self {
            GraphicSet::Kanji | GraphicSet::Drcs(0) => 2,
            _ => 1,
        }
    }
}

/// Descriptor of a broadcast-region decoding profile.
pub trait Profile {
    /// Initial G0..G3 bindings.
    fn initial_sets(&self) -> [GraphicSet; 4];
    fn initial_gl(&self) -> Designator;
    fn initial_gr(&self) -> Designator;
    /// The 16 predefined designator combinations invoked through the
    /// MACRO set (codes 0x60..=0x6F), if this profile defines them.
    fn macros(&self) -> Option<&'static [[GraphicSet; 4]; 16]>;
    /// The grapheme emitted for SP under this profile.
    fn space(&self) -> &'static str;
}

/// Predefined macro combinations of the Japanese broadcast profile
/// (ARIB STD-B24 table 7-20). Each entry atomically replaces G0..G3.
static PROFILE_A_MACROS: [[GraphicSet; 4]; 16] = {
    use GraphicSet::*;
    [
        [Kanji, Alnum, Hiragana, Macro],
        [Kanji, Katakana, Hiragana, Macro],
        [Kanji, Drcs(1), Hiragana, Macro],
        [MosaicA, MosaicC, MosaicD, Macro],
        [MosaicA, MosaicB, MosaicD, Macro],
        [MosaicA, Drcs(1), MosaicD, Macro],
        [Drcs(1), Drcs(2), Drcs(3), Macro],
        [Drcs(4), Drcs(5), Drcs(6), Macro],
        [Drcs(7), Drcs(8), Drcs(9), Macro],
        [Drcs(10), Drcs(11), Drcs(12), Macro],
        [Drcs(13), Drcs(14), Drcs(15), Macro],
        [Kanji, Drcs(2), Hiragana, Macro],
        [Kanji, Drcs(3), Hiragana, Macro],
        [Kanji, Drcs(4), Hiragana, Macro],
        [Katakana, Hiragana, Alnum, Macro],
        [Drcs(1), Hiragana, Alnum, Macro],
    ]
};

/// Japanese broadcast caption profile (operation guideline defaults).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileA;

impl Profile for ProfileA {
    fn initial_sets(&self) -> [GraphicSet; 4] {
        [
            GraphicSet::Kanji,
            GraphicSet::Alnum,
            GraphicSet::Hiragana,
            GraphicSet::Macro,
        ]
    }

    fn initial_gl(&self) -> Designator {
        Designator::G0
    }

    fn initial_gr(&self) -> Designator {
        Designator::G2
    }

    fn macros(&self) -> Option<&'static [[GraphicSet; 4]; 16]> {
        Some(&PROFILE_A_MACROS)
    }

    fn space(&self) -> &'static str {
        "\u{3000}"
    }
}

/// Latin-alphabet regional profile (SBTVD-style operation). No
/// predefined macros: invoking one is a `NotImplemented` condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileLatin;

impl Profile for ProfileLatin {
    fn initial_sets(&self) -> [GraphicSet; 4] {
        [
            GraphicSet::Alnum,
            GraphicSet::Alnum,
            GraphicSet::Drcs(1),
            GraphicSet::Macro,
        ]
    }

    fn initial_gl(&self) -> Designator {
        Designator::G0
    }

    fn initial_gr(&self) -> Designator {
        Designator::G2
    }

    fn macros(&self) -> Option<&'static [[GraphicSet; 4]; 16]> {
        None
    }

    fn space(&self) -> &'static str {
        " "
    }
}

/// Profile selector usable in plain configuration structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionProfile {
    #[default]
    BroadcastJapanese,
    Latin,
}

impl CaptionProfile {
    pub fn descriptor(self) -> &'static dyn Profile {
        static A: ProfileA = ProfileA;
        static LATIN: ProfileLatin = ProfileLatin;
        match self {
            CaptionProfile::BroadcastJapanese => &A,
            CaptionProfile::Latin => &LATIN,
        }
    }
}

/// True for combining marks that must not advance the cursor again
/// after the base glyph they attach to.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' | '\u{3099}'..='\u{309A}' | '\u{20D0}'..='\u{20FF}')
}

/// ARIB additional symbols living above the JIS X 0208 rows, keyed by
/// (row, cell). Only the rows commonly used by caption operation are
/// carried; anything else falls back to a geta mark.
static ARIB_SYMBOLS: &[((u8, u8), &str)] = &[
    // Row 90: units and broadcast pictograms.
    ((90, 1), "⛌"),
    ((90, 2), "⛍"),
    ((90, 3), "❗"),
    ((90, 4), "⛏"),
    ((90, 5), "⛐"),
    ((90, 6), "⛑"),
    ((90, 8), "⛒"),
    ((90, 9), "⛕"),
    ((90, 10), "⛓"),
    ((90, 11), "⛔"),
    ((90, 45), "⛖"),
    ((90, 46), "⛗"),
    ((90, 47), "⛘"),
    ((90, 48), "⛙"),
    ((90, 49), "⛚"),
    // Row 92: enclosed characters and service marks.
    ((92, 1), "➡"),
    ((92, 2), "⬅"),
    ((92, 3), "⬆"),
    ((92, 4), "⬇"),
    ((92, 5), "⬯"),
    ((92, 6), "⬮"),
    ((92, 25), "㊙"),
    ((92, 42), "⚿"),
    ((92, 43), "🈡"),
    ((92, 44), "🈢"),
    ((92, 45), "🈣"),
    ((92, 46), "🈤"),
    ((92, 47), "🈥"),
    ((92, 48), "🅎"),
    // Row 93: broadcast annotations.
    ((93, 1), "㈪"),
    ((93, 2), "㈫"),
    ((93, 3), "㈬"),
    ((93, 4), "㈭"),
    ((93, 5), "㈮"),
    ((93, 6), "㈯"),
    ((93, 7), "㈰"),
    ((93, 8), "㈷"),
    ((93, 9), "㍾"),
    ((93, 10), "㍽"),
    ((93, 11), "㍼"),
    ((93, 12), "㍻"),
    ((93, 13), "№"),
    ((93, 14), "℡"),
    ((93, 15), "〶"),
    ((93, 16), "⚾"),
    ((93, 17), "🉀"),
    ((93, 18), "🉁"),
    ((93, 19), "🉂"),
    ((93, 20), "🉃"),
    ((93, 21), "🉄"),
    ((93, 22), "🉅"),
    ((93, 23), "🉆"),
    ((93, 24), "🉇"),
    ((93, 25), "🉈"),
    ((93, 26), "🄀"),
    ((93, 27), "⒈"),
    ((93, 28), "⒉"),
    ((93, 29), "⒊"),
    ((93, 30), "⒋"),
    ((93, 31), "⒌"),
    ((93, 32), "⒍"),
    ((93, 33), "⒎"),
    ((93, 34), "⒏"),
    ((93, 35), "⒐"),
    ((93, 36), "氏"),
    ((93, 37), "副"),
    ((93, 38), "元"),
    ((93, 39), "故"),
    ((93, 40), "前"),
    ((93, 41), "新"),
    ((93, 48), "🄁"),
    ((93, 49), "🄂"),
    ((93, 50), "🄃"),
    ((93, 51), "🄄"),
    ((93, 52), "🄅"),
    ((93, 53), "🄆"),
    ((93, 54), "🄇"),
    ((93, 55), "🄈"),
    ((93, 56), "🄉"),
    ((93, 57), "🄊"),
    ((93, 90), "🄭"),
    // Row 94: program genre marks.
    ((94, 1), "🈀"),
    ((94, 2), "🈐"),
    ((94, 3), "🈑"),
    ((94, 4), "🈒"),
    ((94, 5), "🈓"),
    ((94, 6), "🅂"),
    ((94, 7), "🈔"),
    ((94, 8), "🈕"),
    ((94, 9), "🈖"),
    ((94, 10), "🅍"),
    ((94, 11), "🄿"),
    ((94, 12), "🅊"),
    ((94, 13), "🅌"),
    ((94, 14), "🈗"),
    ((94, 15), "🈘"),
    ((94, 16), "🈙"),
    ((94, 17), "🈚"),
    ((94, 18), "🈛"),
    ((94, 19), "⚿"),
    ((94, 20), "🈜"),
    ((94, 21), "🈝"),
    ((94, 22), "🈞"),
    ((94, 23), "🈟"),
    ((94, 24), "🈠"),
    ((94, 85), "🅆"),
    ((94, 86), "🅋"),
    ((94, 87), "⮀"),
    ((94, 88), "⮿"),
    ((94, 89), "🅇"),
];

const GETA: &str = "〓";

/// Decodes a two-byte kanji-plane code point (masked to 0x21..=0x7E).
///
/// Rows 1..=84 go through the EUC-JP mapping; the ARIB additional rows
/// use the static table above.
pub fn decode_kanji(c1: u8, c2: u8) -> String {
    let row = c1 - 0x20;
    let cell = c2 - 0x20;
    if row >= 85 {
        return match ARIB_SYMBOLS.iter().find(|(k, _)| *k == (row, cell)) {
            Some((_, s)) => (*s).to_string(),
            None => {
                trace!(row, cell, "unmapped ARIB additional symbol");
                GETA.to_string()
            }
        };
    }

    let euc = [c1 | 0x80, c2 | 0x80];
    let (decoded, _, had_errors) = encoding_rs::EUC_JP.decode(&euc);
    if had_errors {
        trace!(row, cell, "unmapped kanji code point");
        GETA.to_string()
    } else {
        decoded.into_owned()
    }
}

/// Decodes a one-byte code point of a standard (non-DRCS, non-macro)
/// set. Returns `None` for undefined positions and the mosaic sets.
pub fn decode_single(set: GraphicSet, c: u8) -> Option<String> {
    let decoded = match set {
        GraphicSet::Alnum | GraphicSet::PropAlnum => char::from(c).to_string(),
        GraphicSet::Hiragana | GraphicSet::PropHiragana => match c {
            0x21..=0x73 => char::from_u32(0x3041 + (c as u32 - 0x21))?.to_string(),
            0x77 => "ゝ".to_string(),
            0x78 => "ゞ".to_string(),
            0x79 => "ー".to_string(),
            0x7A => "。".to_string(),
            0x7B => "「".to_string(),
            0x7C => "」".to_string(),
            0x7D => "、".to_string(),
            0x7E => "・".to_string(),
            _ => return None,
        },
        GraphicSet::Katakana | GraphicSet::PropKatakana => match c {
            0x21..=0x76 => char::from_u32(0x30A1 + (c as u32 - 0x21))?.to_string(),
            0x77 => "ヽ".to_string(),
            0x78 => "ヾ".to_string(),
            0x79 => "ー".to_string(),
            0x7A => "。".to_string(),
            0x7B => "「".to_string(),
            0x7C => "」".to_string(),
            0x7D => "、".to_string(),
            0x7E => "・".to_string(),
            _ => return None,
        },
        GraphicSet::JisX0201Katakana => match c {
            0x21..=0x5F => char::from_u32(0xFF61 + (c as u32 - 0x21))?.to_string(),
            _ => return None,
        },
        GraphicSet::MosaicA | GraphicSet::MosaicB | GraphicSet::MosaicC | GraphicSet::MosaicD => {
            trace!(code = c, "mosaic code point skipped");
            return None;
        }
        _ => return None,
    };
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanji_euc_jp_mapping() {
        assert_eq!(decode_kanji(0x30, 0x26), "愛");
        assert_eq!(decode_kanji(0x21, 0x21), "\u{3000}");
        assert_eq!(decode_kanji(0x4B, 0x4C), "北");
    }

    #[test]
    fn test_kanji_additional_symbol_rows() {
        assert_eq!(decode_kanji(0x7D, 0x2E), "℡"); // row 93 cell 14
        assert_eq!(decode_kanji(0x7E, 0x23), "🈑"); // row 94 cell 3
        // Unmapped positions fall back rather than erroring.
        assert_eq!(decode_kanji(0x75, 0x7E), GETA);
    }

    #[test]
    fn test_single_byte_sets() {
        assert_eq!(decode_single(GraphicSet::Alnum, b'A').as_deref(), Some("A"));
        assert_eq!(
            decode_single(GraphicSet::Hiragana, 0x22).as_deref(),
            Some("あ")
        );
        assert_eq!(
            decode_single(GraphicSet::Katakana, 0x22).as_deref(),
            Some("ア")
        );
        assert_eq!(
            decode_single(GraphicSet::Hiragana, 0x79).as_deref(),
            Some("ー")
        );
        assert_eq!(
            decode_single(GraphicSet::JisX0201Katakana, 0x21).as_deref(),
            Some("\u{FF61}")
        );
        assert_eq!(decode_single(GraphicSet::Hiragana, 0x74), None);
        assert_eq!(decode_single(GraphicSet::MosaicA, 0x30), None);
    }

    #[test]
    fn test_combining_marks() {
        assert!(is_combining_mark('\u{3099}'));
        assert!(is_combining_mark('\u{20DE}'));
        assert!(!is_combining_mark('あ'));
    }
}
