//! ARIB STD-B24 caption decoding.
//!
//! The crate is organized as a pipeline over one caption statement:
//! [`data_group`] frames the raw payload, [`tokenizer`] turns statement
//! bytes into [`token::Token`]s through the code-extension machinery,
//! and [`parser`] lays the tokens out into positioned, styled output.
//! DRCS glyph registration and replacement live in [`drcs`].

pub mod charset;
pub mod data_group;
pub mod drcs;
pub mod error;
pub mod parser;
pub mod state;
pub mod token;
pub mod tokenizer;

pub use charset::{CaptionProfile, Designator, GraphicSet, Profile};
pub use data_group::{
    CaptionDataGroup, DataUnit, GroupPayload, LanguageEntry, ManagementData, StatementData,
};
pub use drcs::{replace_drcs, DrcsGlyph, DrcsRegistry};
pub use error::{B24Error, Result};
pub use parser::{ParsedToken, Parser};
pub use state::ParserState;
pub use token::Token;
pub use tokenizer::{C1Addressing, Tokenizer};
