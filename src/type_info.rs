//! The on-wire format tag for a bound or returned value.

/// Which of the two PostgreSQL wire encodings a value uses.
///
/// Binary is type-specific and is always preferred by the Value Encoder
/// Registry; text is the canonical textual form and is what the Textual
/// Fallback Mogrifier always produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PgValueFormat {
    Text,
    Binary,
}
