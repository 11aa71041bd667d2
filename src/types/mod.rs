use thiserror::Error;

mod colors;
mod domain_types;
mod ids;

pub use colors::*;
pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid color: {0} (expected one of: {palette})", palette = Color::palette_names().join(", "))]
    InvalidColor(String),

    #[error("Heading level {0} out of range, expected 1..=9")]
    HeadingLevel(u8),

    #[error("Unsupported code language: {0}")]
    UnsupportedLanguage(String),

    #[error("Table dimensions must be positive, got {rows}x{columns}")]
    TableDimensions { rows: u32, columns: u32 },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid identifier for {kind}: {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },
}
