//! Layout state carried through a caption statement.

use crate::token::{CharacterSize, Flashing, Ornament};

/// Caption plane defaults for the horizontal 960x540 writing format.
const PLANE: (u32, u32) = (960, 540);
const FONT_SIZE: (u32, u32) = (36, 36);
const HORIZONTAL_SPACING: u32 = 4;
const VERTICAL_SPACING: u32 = 24;

/// Mutable layout state of the parser.
///
/// A deep copy is attached to every emitted parsed token; snapshots are
/// plain value copies and never alias the live state. All geometry is in
/// dot units, pre-multiplied by the parser's magnification.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserState {
    /// Cursor as (left edge, bottom edge) of the current cell.
    pub position: (i32, i32),
    pub plane: (u32, u32),
    pub area: (u32, u32),
    pub margin: (u32, u32),
    pub font_size: (u32, u32),
    pub horizontal_spacing: u32,
    pub vertical_spacing: u32,
    pub size: CharacterSize,
    /// Active pallete 0..=15.
    pub pallete: u8,
    pub foreground: u8,
    pub background: u8,
    pub half_foreground: u8,
    pub half_background: u8,
    pub underline: bool,
    /// 4-bit edge mask: bottom/right/top/left.
    pub highlight: u8,
    pub ornament: Option<Ornament>,
    pub flashing: Flashing,
    /// Seconds accumulated by TIME wait controls.
    pub elapsed_time: f64,
    /// Absolute end time, when the stream carries one.
    pub end_time: Option<f64>,
}

impl ParserState {
    /// Initial state for the caption plane, scaled by `magnification`.
    pub fn new(magnification: u32) -> ParserState {
        let m = magnification;
        let cell_bottom = (VERTICAL_SPACING + FONT_SIZE.1) * m - 1;
        ParserState {
            position: (0, cell_bottom as i32),
            plane: (PLANE.0 * m, PLANE.1 * m),
            area: (PLANE.0 * m, PLANE.1 * m),
            margin: (0, 0),
            font_size: (FONT_SIZE.0 * m, FONT_SIZE.1 * m),
            horizontal_spacing: HORIZONTAL_SPACING * m,
            vertical_spacing: VERTICAL_SPACING * m,
            size: CharacterSize::Normal,
            pallete: 0,
            foreground: 7,
            background: 8,
            half_foreground: 0,
            half_background: 0,
            underline: false,
            highlight: 0,
            ornament: None,
            flashing: Flashing::Stop,
            elapsed_time: 0.0,
            end_time: None,
        }
    }

    /// Width of one character cell at the current size.
    pub fn cell_width(&self) -> i32 {
        let ((num, den), _) = self.size.scale();
        ((self.horizontal_spacing + self.font_size.0) * num / den) as i32
    }

    /// Height of one character cell at the current size.
    pub fn cell_height(&self) -> i32 {
        let (_, (num, den)) = self.size.scale();
        ((self.vertical_spacing + self.font_size.1) * num / den) as i32
    }
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState::new(1)
    }
}
