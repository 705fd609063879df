//! Byte-level tokenizer for caption statements.
//!
//! One `Tokenizer` instance covers one decoding session: the designator
//! table and the DRCS registry persist across data units and across
//! `tokenize` calls, and are reset only by constructing a new instance.

use tracing::trace;

use crate::charset::{self, Designator, GraphicSet, Profile};
use crate::data_group::{CaptionDataGroup, DataUnit, GroupPayload};
use crate::drcs::DrcsRegistry;
use crate::error::{B24Error, Result};
use crate::token::{
    CharacterSize, Flashing, Ornament, Polarity, TimeControlMode, Token, WritingMode,
};

/// How C1 controls are addressed on the wire.
///
/// Broadcast transport carries them as raw 0x80..=0x9F bytes; text-safe
/// transports re-encode them behind a 0xC2 lead byte so the stream stays
/// valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum C1Addressing {
    #[default]
    EightBit,
    EscapedUtf8,
}

/// The four designator slots plus the GL/GR invocation pointers.
#[derive(Debug, Clone)]
struct DesignatorTable {
    slots: [GraphicSet; 4],
    gl: Designator,
    gr: Designator,
}

impl DesignatorTable {
    fn slot(&self, d: Designator) -> GraphicSet {
        self.slots[d as usize]
    }

    fn designate(&mut self, d: Designator, set: GraphicSet) {
        self.slots[d as usize] = set;
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn try_next(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Reads one byte of a field the stream has already declared;
    /// running out mid-field is a truncation error.
    fn next(&mut self) -> Result<u8> {
        self.try_next().ok_or(B24Error::InsufficientData {
            expected: self.pos + 1,
            actual: self.data.len(),
        })
    }
}

fn designator_for(g: u8) -> Designator {
    match g & 0x03 {
        0 => Designator::G0,
        1 => Designator::G1,
        2 => Designator::G2,
        _ => Designator::G3,
    }
}

fn single_byte_set(final_byte: u8) -> Option<GraphicSet> {
    Some(match final_byte {
        0x4A => GraphicSet::Alnum,
        0x30 => GraphicSet::Hiragana,
        0x31 => GraphicSet::Katakana,
        0x32 => GraphicSet::MosaicA,
        0x33 => GraphicSet::MosaicB,
        0x34 => GraphicSet::MosaicC,
        0x35 => GraphicSet::MosaicD,
        0x36 => GraphicSet::PropAlnum,
        0x37 => GraphicSet::PropHiragana,
        0x38 => GraphicSet::PropKatakana,
        0x49 => GraphicSet::JisX0201Katakana,
        _ => return None,
    })
}

fn drcs_set(final_byte: u8) -> Option<GraphicSet> {
    match final_byte {
        0x41..=0x4F => Some(GraphicSet::Drcs(final_byte - 0x40)),
        0x70 => Some(GraphicSet::Macro),
        _ => None,
    }
}

/// Two-decimal-digit color parameter packed as (tens << 4 | units).
fn packed_color(p: u32) -> u8 {
    ((((p / 100) & 0x0F) << 4) | ((p % 100) & 0x0F)) as u8
}

/// Caption statement tokenizer, parameterized by a decoding profile.
pub struct Tokenizer {
    table: DesignatorTable,
    drcs: DrcsRegistry,
    macros: Option<&'static [[GraphicSet; 4]; 16]>,
    space: &'static str,
    c1: C1Addressing,
}

impl Tokenizer {
    pub fn new(profile: &dyn Profile) -> Tokenizer {
        Tokenizer::with_c1(profile, C1Addressing::EightBit)
    }

    pub fn with_c1(profile: &dyn Profile, c1: C1Addressing) -> Tokenizer {
        Tokenizer {
            table: DesignatorTable {
                slots: profile.initial_sets(),
                gl: profile.initial_gl(),
                gr: profile.initial_gr(),
            },
            drcs: DrcsRegistry::new(),
            macros: profile.macros(),
            space: profile.space(),
            c1,
        }
    }

    pub fn drcs_registry(&self) -> &DrcsRegistry {
        &self.drcs
    }

    /// Registers the glyphs of one DRCS data unit.
    pub fn process_drcs(&mut self, byte_width: u8, data: &[u8]) -> Result<()> {
        self.drcs.process_unit(byte_width, data)
    }

    /// Tokenizes every data unit of one data group, registering DRCS
    /// units along the way.
    pub fn tokenize(&mut self, group: &CaptionDataGroup) -> Result<Vec<Token>> {
        let units = match &group.payload {
            GroupPayload::Management(management) => &management.units,
            GroupPayload::Statement(statement) => &statement.units,
        };

        let mut tokens = Vec::new();
        for unit in units {
            match unit {
                DataUnit::Statement(body) => self.scan(body, &mut tokens)?,
                DataUnit::Drcs { byte_width, data } => self.process_drcs(*byte_width, data)?,
            }
        }
        Ok(tokens)
    }

    /// Single forward pass over one statement body.
    pub fn scan(&mut self, data: &[u8], out: &mut Vec<Token>) -> Result<()> {
        let mut r = Reader::new(data);
        while let Some(b) = r.try_next() {
            match b {
                // GL range.
                0x21..=0x7E => self.graphic(self.table.gl, b, &mut r, out)?,

                // Byte-safe C1 lead. Must win over the GR arm below.
                0xC2 if self.c1 == C1Addressing::EscapedUtf8 => {
                    let v = r.next()?;
                    if (0x80..=0x9F).contains(&v) {
                        self.control_c1(v, &mut r, out)?;
                    } else {
                        trace!(byte = v, "stray 0xC2 lead skipped");
                    }
                }

                // GR range, high bit masked off.
                0xA1..=0xFE => self.graphic(self.table.gr, b & 0x7F, &mut r, out)?,

                // C0
                0x00 => out.push(Token::Null),
                0x07 => return Err(B24Error::NotUsedByStandard("BEL")),
                0x08 => out.push(Token::ActivePositionBackward),
                0x09 => out.push(Token::ActivePositionForward),
                0x0A => out.push(Token::ActivePositionDown),
                0x0B => out.push(Token::ActivePositionUp),
                0x0C => out.push(Token::ClearScreen),
                0x0D => out.push(Token::ActivePositionReturn),
                0x0E => self.table.gl = Designator::G1, // LS1
                0x0F => self.table.gl = Designator::G0, // LS0
                0x16 => {
                    let p = r.next()? & 0x3F;
                    out.push(Token::ParameterizedActivePositionForward(p));
                }
                0x18 => return Err(B24Error::NotUsedByStandard("CAN")),
                0x19 => {
                    // SS2: one graphic through G2 without moving GL.
                    let c = r.next()?;
                    self.single_shift(Designator::G2, c, &mut r, out)?;
                }
                0x1B => self.escape(&mut r)?,
                0x1C => {
                    let p1 = r.next()? & 0x3F;
                    let p2 = r.next()? & 0x3F;
                    out.push(Token::ActivePositionSet(p1, p2));
                }
                0x1D => {
                    let c = r.next()?;
                    self.single_shift(Designator::G3, c, &mut r, out)?;
                }
                0x1E => out.push(Token::RecordSeparator),
                0x1F => out.push(Token::UnitSeparator),
                0x20 => out.push(Token::Character {
                    text: self.space.to_string(),
                    non_spacing: false,
                }),
                0x7F => out.push(Token::Delete),

                0x80..=0x9F => self.control_c1(b, &mut r, out)?,

                other => trace!(byte = other, "undefined code point skipped"),
            }
        }
        Ok(())
    }

    fn single_shift(
        &mut self,
        slot: Designator,
        c: u8,
        r: &mut Reader<'_>,
        out: &mut Vec<Token>,
    ) -> Result<()> {
        match c {
            0x21..=0x7E | 0xA1..=0xFE => self.graphic(slot, c & 0x7F, r, out),
            other => {
                trace!(byte = other, "single shift over non-graphic byte");
                Ok(())
            }
        }
    }

    /// Resolves one code point through the dictionary bound to `slot`.
    fn graphic(
        &mut self,
        slot: Designator,
        c1: u8,
        r: &mut Reader<'_>,
        out: &mut Vec<Token>,
    ) -> Result<()> {
        let set = self.table.slot(slot);
        if set.byte_width() == 1 {
            return self.graphic_single(set, c1, out);
        }

        let c2 = match r.next()? {
            c @ (0x21..=0x7E | 0xA1..=0xFE) => c & 0x7F,
            other => {
                trace!(byte = other, "second byte outside graphic range");
                return Ok(());
            }
        };
        match set {
            GraphicSet::Kanji => {
                out.push(Token::character(charset::decode_kanji(c1, c2)));
                Ok(())
            }
            GraphicSet::Drcs(0) => {
                let code = u16::from_be_bytes([c1, c2]);
                if let Some(glyph) = self.drcs.lookup(0, code) {
                    out.push(Token::Drcs(glyph.clone()));
                } else {
                    trace!(code, "DRCS-0 glyph not registered yet");
                }
                Ok(())
            }
            _ => Err(B24Error::Unreachable("two-byte lookup in one-byte set")),
        }
    }

    fn graphic_single(&mut self, set: GraphicSet, c1: u8, out: &mut Vec<Token>) -> Result<()> {
        match set {
            GraphicSet::Drcs(n) => {
                if let Some(glyph) = self.drcs.lookup(n, c1 as u16) {
                    out.push(Token::Drcs(glyph.clone()));
                } else {
                    trace!(set = n, code = c1, "DRCS glyph not registered yet");
                }
                Ok(())
            }
            GraphicSet::Macro => self.invoke_macro(c1),
            _ => {
                if let Some(text) = charset::decode_single(set, c1) {
                    out.push(Token::character(text));
                } else {
                    trace!(code = c1, ?set, "undefined code point in set");
                }
                Ok(())
            }
        }
    }

    /// One of the 16 fixed macro code points atomically replaces all
    /// four designator slots.
    fn invoke_macro(&mut self, code: u8) -> Result<()> {
        let Some(macros) = self.macros else {
            return Err(B24Error::NotImplemented(
                "macro invocation in a profile without predefined macros",
            ));
        };
        if (0x60..=0x6F).contains(&code) {
            self.table.slots = macros[(code - 0x60) as usize];
        } else {
            trace!(code, "macro code outside the predefined range");
        }
        Ok(())
    }

    /// ESC sequence: designator reassignment or locking shift.
    fn escape(&mut self, r: &mut Reader<'_>) -> Result<()> {
        match r.next()? {
            0x6E => self.table.gl = Designator::G2, // LS2
            0x6F => self.table.gl = Designator::G3, // LS3
            0x7E => self.table.gr = Designator::G1, // LS1R
            0x7D => self.table.gr = Designator::G2, // LS2R
            0x7C => self.table.gr = Designator::G3, // LS3R

            // One-byte set, optionally a DRCS set after the 0x20
            // intermediate.
            g @ 0x28..=0x2B => {
                let d = designator_for(g);
                match r.next()? {
                    0x20 => {
                        let f = r.next()?;
                        match drcs_set(f) {
                            Some(set) => self.table.designate(d, set),
                            None => trace!(byte = f, "unknown one-byte DRCS final"),
                        }
                    }
                    f => match single_byte_set(f) {
                        Some(set) => self.table.designate(d, set),
                        None => trace!(byte = f, "unknown one-byte set final"),
                    },
                }
            }

            // Two-byte (kanji-class) set.
            0x24 => match r.next()? {
                0x42 | 0x39 | 0x3A | 0x3B => self.table.designate(Designator::G0, GraphicSet::Kanji),
                g @ 0x28..=0x2B => {
                    let d = designator_for(g);
                    match r.next()? {
                        0x20 => {
                            let f = r.next()?;
                            if f == 0x40 {
                                self.table.designate(d, GraphicSet::Drcs(0));
                            } else {
                                trace!(byte = f, "unknown two-byte DRCS final");
                            }
                        }
                        0x42 | 0x39 | 0x3A | 0x3B if g != 0x28 => {
                            self.table.designate(d, GraphicSet::Kanji);
                        }
                        f => trace!(byte = f, "unknown two-byte set final"),
                    }
                }
                f => trace!(byte = f, "unknown two-byte designation"),
            },

            other => trace!(byte = other, "unknown escape sequence"),
        }
        Ok(())
    }

    fn control_c1(&mut self, b: u8, r: &mut Reader<'_>, out: &mut Vec<Token>) -> Result<()> {
        match b {
            // BKF..=WHF
            0x80..=0x87 => out.push(Token::ColorForeground(b & 0x07)),

            0x88 => out.push(Token::SmallSize),
            0x89 => out.push(Token::MiddleSize),
            0x8A => out.push(Token::NormalSize),
            0x8B => match r.next()? {
                0x60 => out.push(Token::CharacterSizeControl(CharacterSize::Tiny)),
                0x41 => out.push(Token::CharacterSizeControl(CharacterSize::DoubleHeight)),
                0x44 => out.push(Token::CharacterSizeControl(CharacterSize::DoubleWidth)),
                0x45 => out.push(Token::CharacterSizeControl(
                    CharacterSize::DoubleHeightAndWidth,
                )),
                p => trace!(byte = p, "unknown SZX parameter"),
            },

            0x90 => match r.next()? {
                p @ 0x48..=0x4F => out.push(Token::ColorControlForeground(p & 0x0F)),
                p @ 0x50..=0x5F => out.push(Token::ColorControlBackground(p & 0x0F)),
                p @ 0x60..=0x6F => out.push(Token::ColorControlHalfForeground(p & 0x0F)),
                p @ 0x70..=0x7F => out.push(Token::ColorControlHalfBackground(p & 0x0F)),
                0x20 => out.push(Token::PalleteControl(r.next()? & 0x0F)),
                p => trace!(byte = p, "unknown COL parameter"),
            },

            0x91 => match r.next()? {
                0x40 => out.push(Token::FlashingControl(Flashing::Normal)),
                0x47 => out.push(Token::FlashingControl(Flashing::Inverted)),
                0x4F => out.push(Token::FlashingControl(Flashing::Stop)),
                p => trace!(byte = p, "unknown FLC parameter"),
            },

            0x92 => match r.next()? {
                0x40 => out.push(Token::SingleConcealmentMode),
                0x4F => out.push(Token::ConcealmentModeStop),
                0x20 => {
                    let p = r.next()?;
                    if (0x40..=0x4A).contains(&p) {
                        out.push(Token::ReplacingConcealmentMode(p & 0x0F));
                    } else {
                        trace!(byte = p, "unknown CDC replacing mode");
                    }
                }
                p => trace!(byte = p, "unknown CDC parameter"),
            },

            0x93 => match r.next()? {
                0x40 => out.push(Token::PatternPolarityControl(Polarity::Normal)),
                0x41 => out.push(Token::PatternPolarityControl(Polarity::Inverted1)),
                0x42 => out.push(Token::PatternPolarityControl(Polarity::Inverted2)),
                p => trace!(byte = p, "unknown POL parameter"),
            },

            0x94 => match r.next()? {
                0x40 => out.push(Token::WritingModeModification(WritingMode::Both)),
                0x44 => out.push(Token::WritingModeModification(WritingMode::ForegroundOnly)),
                0x45 => out.push(Token::WritingModeModification(WritingMode::BackgroundOnly)),
                p => trace!(byte = p, "unknown WMM parameter"),
            },

            0x95 => {
                return Err(B24Error::NotImplemented("inline MACRO definition segment"));
            }

            0x97 => out.push(Token::HilightingCharacterBlock(r.next()? & 0x0F)),
            0x98 => out.push(Token::RepeatCharacter(r.next()? & 0x3F)),
            0x99 => out.push(Token::StopLining),
            0x9A => out.push(Token::StartLining),
            0x9B => self.csi(r, out)?,
            0x9D => self.time(r, out)?,

            0x8C..=0x8F | 0x96 | 0x9C | 0x9E | 0x9F => {
                return Err(B24Error::NotUsedByStandard("undefined C1 control"));
            }

            _ => return Err(B24Error::Unreachable("C1 dispatch")),
        }
        Ok(())
    }

    /// CSI: decimal parameters separated by 0x3B, a 0x20 intermediate,
    /// then the final function byte.
    fn csi(&mut self, r: &mut Reader<'_>, out: &mut Vec<Token>) -> Result<()> {
        let mut params: Vec<u32> = Vec::new();
        let mut current: u32 = 0;
        let final_byte = loop {
            match r.next()? {
                d @ 0x30..=0x39 => current = current * 10 + (d - 0x30) as u32,
                0x3B => {
                    params.push(current);
                    current = 0;
                }
                0x20 => {
                    params.push(current);
                    break r.next()?;
                }
                other => {
                    trace!(byte = other, "unexpected CSI byte, skipping sequence");
                    return skip_to_final(r);
                }
            }
        };

        match (final_byte, params.as_slice()) {
            (0x53, &[format, ..]) => out.push(Token::SetWritingFormat(format)),
            (0x56, &[w, h]) => out.push(Token::SetDisplayFormat(w, h)),
            (0x57, &[w, h]) => out.push(Token::CharacterCompositionDotDesignation(w, h)),
            (0x58, &[s]) => out.push(Token::SetHorizontalSpacing(s)),
            (0x59, &[s]) => out.push(Token::SetVerticalSpacing(s)),
            (0x5F, &[x, y]) => out.push(Token::SetDisplayPosition(x, y)),
            (0x61, &[x, y]) => out.push(Token::ActiveCoordinatePositionSet(x, y)),
            (0x63, &[0] | &[0, _]) => out.push(Token::OrnamentControl(Ornament::Clear)),
            (0x63, &[1, c]) => out.push(Token::OrnamentControl(Ornament::Hemming(packed_color(c)))),
            (0x63, &[2, c]) => out.push(Token::OrnamentControl(Ornament::Shade(packed_color(c)))),
            (0x63, &[3] | &[3, _]) => out.push(Token::OrnamentControl(Ornament::Hollow)),
            (0x68, &[id]) => out.push(Token::BuiltinSoundReplay(id)),
            (0x6E, &[c]) => out.push(Token::RasterColourCommand((c & 0x0F) as u8)),

            // Recognized but unhandled finals: raised, never dropped,
            // so conformance tests can see the coverage gap.
            (0x42, _) => return Err(B24Error::NotImplemented("CSI GSM")),
            (0x54, _) => return Err(B24Error::NotImplemented("CSI CCC")),
            (0x5B, _) => return Err(B24Error::NotImplemented("CSI PLD")),
            (0x5C, _) => return Err(B24Error::NotImplemented("CSI PLU")),
            (0x5D, _) => return Err(B24Error::NotImplemented("CSI GAA")),
            (0x5E, _) => return Err(B24Error::NotImplemented("CSI SRC")),
            (0x62, _) => return Err(B24Error::NotImplemented("CSI TCC")),
            (0x64, _) => return Err(B24Error::NotImplemented("CSI MDF")),
            (0x65, _) => return Err(B24Error::NotImplemented("CSI CFS")),
            (0x66, _) => return Err(B24Error::NotImplemented("CSI XCS")),
            (0x67, _) => return Err(B24Error::NotImplemented("CSI SCR")),
            (0x69, _) => return Err(B24Error::NotImplemented("CSI ACS")),
            (0x6A, _) => return Err(B24Error::NotImplemented("CSI UED")),
            (0x6F, _) => return Err(B24Error::NotImplemented("CSI SCS")),

            (f, p) => trace!(final_byte = f, params = ?p, "reserved CSI final skipped"),
        }
        Ok(())
    }

    fn time(&mut self, r: &mut Reader<'_>, out: &mut Vec<Token>) -> Result<()> {
        match r.next()? {
            0x20 => {
                let tenths = r.next()? & 0x3F;
                out.push(Token::TimeControlWait(tenths as f64 / 10.0));
            }
            0x28 => match r.next()? {
                0x40 => out.push(Token::TimeControlMode(TimeControlMode::Free)),
                0x41 => out.push(Token::TimeControlMode(TimeControlMode::RealTime)),
                0x42 => out.push(Token::TimeControlMode(TimeControlMode::OffsetTime)),
                0x43 => out.push(Token::TimeControlMode(TimeControlMode::Reserved)),
                p => trace!(byte = p, "unknown time control mode"),
            },
            0x29 => return Err(B24Error::NotImplemented("TIME presentation control")),
            p => trace!(byte = p, "unknown TIME parameter"),
        }
        Ok(())
    }
}

/// Consumes the rest of a parameterized sequence: everything up to the
/// 0x20 intermediate plus the final byte.
fn skip_to_final(r: &mut Reader<'_>) -> Result<()> {
    while r.next()? != 0x20 {}
    let _ = r.next()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::{CaptionProfile, ProfileLatin};
    use crate::data_group::fixtures::statement_group;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(CaptionProfile::BroadcastJapanese.descriptor())
    }

    fn tokenize(t: &mut Tokenizer, bytes: &[u8]) -> Result<Vec<Token>> {
        let raw = statement_group(1, &[(0x20, bytes)]);
        let group = CaptionDataGroup::parse(&raw).unwrap();
        t.tokenize(&group)
    }

    fn character(text: &str) -> Token {
        Token::Character {
            text: text.to_string(),
            non_spacing: false,
        }
    }

    #[test]
    fn test_default_kanji_literal() {
        let mut t = tokenizer();
        let tokens = tokenize(&mut t, &[0x30, 0x26]).unwrap();
        assert_eq!(tokens, vec![character("愛")]);
    }

    #[test]
    fn test_c0_literals() {
        let mut t = tokenizer();
        assert_eq!(tokenize(&mut t, &[0x00]).unwrap(), vec![Token::Null]);
        assert_eq!(tokenize(&mut t, &[0x0C]).unwrap(), vec![Token::ClearScreen]);
        assert_eq!(
            tokenize(&mut t, &[0x20]).unwrap(),
            vec![character("\u{3000}")]
        );
    }

    #[test]
    fn test_gr_hiragana_default() {
        let mut t = tokenizer();
        // GR -> G2 -> hiragana; 0xA2 & 0x7F = 0x22 -> あ
        let tokens = tokenize(&mut t, &[0xA2]).unwrap();
        assert_eq!(tokens, vec![character("あ")]);
    }

    #[test]
    fn test_csi_set_display_format() {
        let mut t = tokenizer();
        let bytes = [0x9B, 0x36, 0x38, 0x30, 0x3B, 0x34, 0x38, 0x30, 0x20, 0x56];
        let tokens = tokenize(&mut t, &bytes).unwrap();
        assert_eq!(tokens, vec![Token::SetDisplayFormat(680, 480)]);
    }

    #[test]
    fn test_escape_designation_persists_across_units() {
        let mut t = tokenizer();
        // ESC 0x28 0x31: G0 <- katakana.
        let tokens = tokenize(&mut t, &[0x1B, 0x28, 0x31, 0x22]).unwrap();
        assert_eq!(tokens, vec![character("ア")]);
        // Designator state survives into the next data unit.
        let tokens = tokenize(&mut t, &[0x25]).unwrap();
        assert_eq!(tokens, vec![character("ゥ")]);
    }

    #[test]
    fn test_locking_and_single_shift() {
        let mut t = tokenizer();
        // LS1 invokes G1 (alnum) into GL.
        let tokens = tokenize(&mut t, &[0x0E, b'A', b'b']).unwrap();
        assert_eq!(tokens, vec![character("A"), character("b")]);
        // SS2 shifts a single code point through G2 (hiragana).
        let tokens = tokenize(&mut t, &[0x19, 0x22, b'C']).unwrap();
        assert_eq!(tokens, vec![character("あ"), character("C")]);
    }

    #[test]
    fn test_macro_designation_replaces_all_slots() {
        let mut t = tokenizer();
        // SS3 reaches G3 (macro); 0x61 binds G1 <- katakana.
        let tokens = tokenize(&mut t, &[0x1D, 0x61, 0x0E, 0x22]).unwrap();
        assert_eq!(tokens, vec![character("ア")]);
    }

    #[test]
    fn test_macro_without_predefined_set_is_not_implemented() {
        let mut t = Tokenizer::new(&ProfileLatin);
        let err = tokenize(&mut t, &[0x1D, 0x60]).unwrap_err();
        assert!(matches!(err, B24Error::NotImplemented(_)));
    }

    #[test]
    fn test_drcs_register_then_resolve() {
        let mut t = tokenizer();
        let unit = [
            0x01, 0x41, 0x21, 0x01, 0x00, 0x00, 0x02, 0x02, 0b1100_0000,
        ];
        let raw = statement_group(1, &[(0x30, &unit), (0x20, &[0x1B, 0x29, 0x20, 0x41, 0x0E, 0x21])]);
        let group = CaptionDataGroup::parse(&raw).unwrap();
        let tokens = t.tokenize(&group).unwrap();
        assert_eq!(tokens.len(), 1);
        let Token::Drcs(glyph) = &tokens[0] else {
            panic!("expected DRCS token, got {:?}", tokens[0]);
        };
        assert_eq!((glyph.width, glyph.height), (2, 2));
    }

    #[test]
    fn test_unregistered_drcs_code_yields_no_token() {
        let mut t = tokenizer();
        let tokens = tokenize(&mut t, &[0x1B, 0x29, 0x20, 0x41, 0x0E, 0x45]).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_error_taxonomy_is_distinguishable() {
        let mut t = tokenizer();
        let bel = tokenize(&mut t, &[0x07]).unwrap_err();
        assert!(matches!(bel, B24Error::NotUsedByStandard("BEL")));

        let mut t = tokenizer();
        let gsm = tokenize(&mut t, &[0x9B, 0x31, 0x3B, 0x32, 0x20, 0x42]).unwrap_err();
        assert!(matches!(gsm, B24Error::NotImplemented("CSI GSM")));

        let mut t = tokenizer();
        let truncated = tokenize(&mut t, &[0x1C, 0x41]).unwrap_err();
        assert!(matches!(truncated, B24Error::InsufficientData { .. }));
    }

    #[test]
    fn test_time_wait_in_tenths() {
        let mut t = tokenizer();
        let tokens = tokenize(&mut t, &[0x9D, 0x20, 0x40 | 50]).unwrap();
        assert_eq!(tokens, vec![Token::TimeControlWait(5.0)]);
    }

    #[test]
    fn test_color_controls() {
        let mut t = tokenizer();
        let tokens = tokenize(&mut t, &[0x84, 0x90, 0x52, 0x90, 0x20, 0x42]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::ColorForeground(4),
                Token::ColorControlBackground(2),
                Token::PalleteControl(2),
            ]
        );
    }

    #[test]
    fn test_escaped_utf8_c1_addressing() {
        let mut t = Tokenizer::with_c1(
            CaptionProfile::BroadcastJapanese.descriptor(),
            C1Addressing::EscapedUtf8,
        );
        let tokens = tokenize(&mut t, &[0xC2, 0x88]).unwrap();
        assert_eq!(tokens, vec![Token::SmallSize]);
    }

    #[test]
    fn test_repeat_and_highlight() {
        let mut t = tokenizer();
        let tokens = tokenize(&mut t, &[0x98, 0x43, 0x97, 0x4F]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::RepeatCharacter(3),
                Token::HilightingCharacterBlock(0x0F),
            ]
        );
    }
}
