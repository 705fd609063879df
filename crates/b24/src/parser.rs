//! Layout pass: turns a token stream into positioned, styled output.
//!
//! The parser walks the token stream once, mutating a working
//! [`ParserState`] and attaching an owned snapshot of it to every
//! visible token. Emission happens before the cursor advance, so each
//! snapshot describes the cell the glyph occupies.

use tracing::trace;

use crate::drcs::DrcsGlyph;
use crate::state::ParserState;
use crate::token::{CharacterSize, Ornament, Token};

/// A visible token with the layout state it was produced under.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedToken {
    Character {
        text: String,
        non_spacing: bool,
        state: ParserState,
    },
    Drcs {
        glyph: DrcsGlyph,
        state: ParserState,
    },
    /// Screen erasure. `elapsed_time` is the in-statement offset in
    /// seconds at which the erase takes effect.
    ClearScreen {
        elapsed_time: f64,
        state: ParserState,
    },
}

/// Stateless layout driver; per-statement state lives in the
/// [`ParserState`] threaded through [`Parser::parse`].
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    magnification: u32,
}

impl Parser {
    pub fn new(magnification: u32) -> Parser {
        Parser {
            magnification: magnification.max(1),
        }
    }

    /// Initial state for this parser's magnification.
    pub fn initial_state(&self) -> ParserState {
        ParserState::new(self.magnification)
    }

    /// Lays out one statement's tokens starting from `initial`.
    pub fn parse(&self, initial: &ParserState, tokens: &[Token]) -> Vec<ParsedToken> {
        let m = self.magnification as i32;
        let mut state = initial.clone();
        let mut out = Vec::new();
        let mut repeat: Option<u8> = None;

        for token in tokens {
            match token {
                Token::Character { text, non_spacing } => {
                    if *non_spacing {
                        // Combining mark: shares the previous advance.
                        out.push(ParsedToken::Character {
                            text: text.clone(),
                            non_spacing: true,
                            state: state.clone(),
                        });
                        continue;
                    }
                    match repeat.take() {
                        None => {
                            out.push(ParsedToken::Character {
                                text: text.clone(),
                                non_spacing: false,
                                state: state.clone(),
                            });
                            forward(&mut state);
                        }
                        Some(0) => fill_line(&mut state, &mut out, text),
                        Some(n) => {
                            for _ in 0..n {
                                out.push(ParsedToken::Character {
                                    text: text.clone(),
                                    non_spacing: false,
                                    state: state.clone(),
                                });
                                forward(&mut state);
                            }
                        }
                    }
                }
                Token::Drcs(glyph) => {
                    out.push(ParsedToken::Drcs {
                        glyph: glyph.clone(),
                        state: state.clone(),
                    });
                    forward(&mut state);
                }
                Token::ClearScreen => {
                    out.push(ParsedToken::ClearScreen {
                        elapsed_time: state.elapsed_time,
                        state: state.clone(),
                    });
                }

                Token::ActivePositionBackward => backward(&mut state),
                Token::ActivePositionForward => forward(&mut state),
                Token::ActivePositionDown => down(&mut state),
                Token::ActivePositionUp => up(&mut state),
                Token::ActivePositionReturn => {
                    state.position.0 = 0;
                    down(&mut state);
                }
                Token::ParameterizedActivePositionForward(p) => {
                    // Stays on the current row; the stream guarantees
                    // the count fits.
                    state.position.0 += *p as i32 * state.cell_width();
                }
                Token::ActivePositionSet(row, col) => {
                    let w = state.cell_width();
                    let h = state.cell_height();
                    state.position = (*col as i32 * w, (*row as i32 + 1) * h - 1);
                }
                Token::ActiveCoordinatePositionSet(x, y) => {
                    state.position = (*x as i32 * m, *y as i32 * m);
                }

                Token::ColorForeground(idx) => {
                    state.foreground = (state.pallete << 4) | idx;
                }
                Token::ColorControlForeground(idx) => {
                    state.foreground = (state.pallete << 4) | idx;
                }
                Token::ColorControlBackground(idx) => {
                    state.background = (state.pallete << 4) | idx;
                }
                Token::ColorControlHalfForeground(idx) => {
                    state.half_foreground = (state.pallete << 4) | idx;
                }
                Token::ColorControlHalfBackground(idx) => {
                    state.half_background = (state.pallete << 4) | idx;
                }
                Token::PalleteControl(p) => state.pallete = *p,

                Token::SmallSize => state.size = CharacterSize::Small,
                Token::MiddleSize => state.size = CharacterSize::Middle,
                Token::NormalSize => state.size = CharacterSize::Normal,
                Token::CharacterSizeControl(size) => state.size = *size,

                Token::FlashingControl(f) => state.flashing = *f,
                Token::StartLining => state.underline = true,
                Token::StopLining => state.underline = false,
                Token::HilightingCharacterBlock(mask) => state.highlight = *mask,
                Token::OrnamentControl(Ornament::Clear) => state.ornament = None,
                Token::OrnamentControl(orn) => state.ornament = Some(*orn),

                Token::SetWritingFormat(format) => match format {
                    5 => set_plane(&mut state, (1920, 1080), m),
                    7 => set_plane(&mut state, (960, 540), m),
                    9 => set_plane(&mut state, (720, 480), m),
                    11 => set_plane(&mut state, (1280, 720), m),
                    other => trace!(format = other, "unsupported writing format"),
                },
                Token::SetDisplayFormat(w, h) => {
                    state.area = (w * self.magnification, h * self.magnification);
                }
                Token::SetDisplayPosition(x, y) => {
                    state.margin = (x * self.magnification, y * self.magnification);
                }
                Token::CharacterCompositionDotDesignation(w, h) => {
                    state.font_size = (w * self.magnification, h * self.magnification);
                }
                Token::SetHorizontalSpacing(s) => {
                    state.horizontal_spacing = s * self.magnification;
                }
                Token::SetVerticalSpacing(s) => {
                    state.vertical_spacing = s * self.magnification;
                }

                Token::TimeControlWait(seconds) => state.elapsed_time += seconds,
                Token::RepeatCharacter(n) => repeat = Some(*n),

                // No layout effect.
                Token::Null
                | Token::Delete
                | Token::RecordSeparator
                | Token::UnitSeparator
                | Token::SingleConcealmentMode
                | Token::ReplacingConcealmentMode(_)
                | Token::ConcealmentModeStop
                | Token::PatternPolarityControl(_)
                | Token::WritingModeModification(_)
                | Token::TimeControlMode(_)
                | Token::BuiltinSoundReplay(_)
                | Token::RasterColourCommand(_) => {}
            }
        }
        out
    }
}

fn set_plane(state: &mut ParserState, plane: (u32, u32), m: i32) {
    let m = m as u32;
    state.plane = (plane.0 * m, plane.1 * m);
    state.area = state.plane;
    state.margin = (0, 0);
}

/// Advances one cell to the right, wrapping to the start of the next
/// row when the following cell would overflow the display area.
fn forward(state: &mut ParserState) {
    let w = state.cell_width();
    state.position.0 += w;
    if state.position.0 + w > state.area.0 as i32 {
        state.position.0 = 0;
        down(state);
    }
}

fn backward(state: &mut ParserState) {
    let w = state.cell_width();
    state.position.0 -= w;
    if state.position.0 < 0 {
        state.position.0 = (state.area.0 as i32 / w - 1) * w;
        up(state);
    }
}

fn down(state: &mut ParserState) {
    let h = state.cell_height();
    state.position.1 += h;
    if state.position.1 >= state.area.1 as i32 {
        state.position.1 = h - 1;
    }
}

fn up(state: &mut ParserState) {
    let h = state.cell_height();
    state.position.1 -= h;
    if state.position.1 < 0 {
        state.position.1 = (state.area.1 as i32 / h) * h - 1;
    }
}

/// RPC with count zero: repeats the glyph across the remainder of the
/// current row without wrapping.
fn fill_line(state: &mut ParserState, out: &mut Vec<ParsedToken>, text: &str) {
    let w = state.cell_width();
    loop {
        out.push(ParsedToken::Character {
            text: text.to_string(),
            non_spacing: false,
            state: state.clone(),
        });
        if state.position.0 + 2 * w > state.area.0 as i32 {
            forward(state);
            break;
        }
        state.position.0 += w;
    }
}
