//! Token stream produced by the tokenizer.

use crate::drcs::DrcsGlyph;

/// Character size selected by SSZ/MSZ/NSZ or SZX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSize {
    Small,
    Middle,
    Normal,
    Tiny,
    DoubleHeight,
    DoubleWidth,
    DoubleHeightAndWidth,
}

impl CharacterSize {
    /// Horizontal and vertical cell scale as (numerator, denominator)
    /// pairs, applied on top of the base font/spacing geometry.
    pub fn scale(self) -> ((u32, u32), (u32, u32)) {
        match self {
            CharacterSize::Small | CharacterSize::Tiny => ((1, 2), (1, 2)),
            CharacterSize::Middle => ((1, 2), (1, 1)),
            CharacterSize::Normal => ((1, 1), (1, 1)),
            CharacterSize::DoubleHeight => ((1, 1), (2, 1)),
            CharacterSize::DoubleWidth => ((2, 1), (1, 1)),
            CharacterSize::DoubleHeightAndWidth => ((2, 1), (2, 1)),
        }
    }
}

/// Flashing state set by FLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flashing {
    Stop,
    Normal,
    Inverted,
}

/// Pattern polarity set by POL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Normal,
    Inverted1,
    Inverted2,
}

/// Writing mode set by WMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingMode {
    Both,
    ForegroundOnly,
    BackgroundOnly,
}

/// Time control mode set by TIME 0x28.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlMode {
    Free,
    RealTime,
    OffsetTime,
    Reserved,
}

/// Character ornament set by the ORN control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ornament {
    Clear,
    /// Hemming with a pallete-encoded color index.
    Hemming(u8),
    /// Shading with a pallete-encoded color index.
    Shade(u8),
    Hollow,
}

/// One decoded element of a caption statement.
///
/// `Character` and `Drcs` are the visible tokens; everything else is a
/// control that mutates parser state.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// One grapheme. `non_spacing` marks Unicode combining marks that
    /// share the previous token's cursor advance.
    Character { text: String, non_spacing: bool },
    /// A broadcaster-supplied glyph resolved from the DRCS registry.
    Drcs(DrcsGlyph),

    // C0
    Null,
    ActivePositionBackward,
    ActivePositionForward,
    ActivePositionDown,
    ActivePositionUp,
    ActivePositionReturn,
    ParameterizedActivePositionForward(u8),
    ActivePositionSet(u8, u8),
    ClearScreen,
    Delete,
    RecordSeparator,
    UnitSeparator,

    // C1
    /// BKF..WHF one-byte foreground commands, fixed offsets 0..=7.
    ColorForeground(u8),
    ColorControlForeground(u8),
    ColorControlBackground(u8),
    ColorControlHalfForeground(u8),
    ColorControlHalfBackground(u8),
    PalleteControl(u8),
    SmallSize,
    MiddleSize,
    NormalSize,
    CharacterSizeControl(CharacterSize),
    FlashingControl(Flashing),
    SingleConcealmentMode,
    ReplacingConcealmentMode(u8),
    ConcealmentModeStop,
    PatternPolarityControl(Polarity),
    WritingModeModification(WritingMode),
    HilightingCharacterBlock(u8),
    RepeatCharacter(u8),
    StartLining,
    StopLining,
    TimeControlWait(f64),
    TimeControlMode(TimeControlMode),

    // CSI
    SetWritingFormat(u32),
    SetDisplayFormat(u32, u32),
    SetDisplayPosition(u32, u32),
    CharacterCompositionDotDesignation(u32, u32),
    SetHorizontalSpacing(u32),
    SetVerticalSpacing(u32),
    ActiveCoordinatePositionSet(u32, u32),
    OrnamentControl(Ornament),
    BuiltinSoundReplay(u32),
    RasterColourCommand(u8),
}

impl Token {
    pub fn character(text: impl Into<String>) -> Token {
        let text = text.into();
        let non_spacing = text
            .chars()
            .next()
            .is_some_and(super::charset::is_combining_mark);
        Token::Character { text, non_spacing }
    }
}
