//! Error types for the QIR parser.

use thiserror::Error;

/// Errors that can occur while parsing a QIR program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The entry-point attribute group is missing or does not carry the
    /// profile name and qubit/result counts.
    #[error("QIR does not declare the required entry-point attributes (profile, qubit count, result count)")]
    MissingMetadata,

    /// The program declares a profile other than the one this parser accepts.
    #[error("unsupported QIR profile '{0}': only base_profile programs are accepted")]
    UnsupportedProfile(String),

    /// The entry point contains branches, loops, or more than one block.
    #[error("control flow is not supported: {0}")]
    UnsupportedControlFlow(String),

    /// A qubit or result operand exceeds the declared count.
    #[error("{space} operand {index} is out of range: program declares {count}")]
    OperandOutOfRange {
        /// Either "qubit" or "result".
        space: &'static str,
        /// The offending operand index.
        index: u32,
        /// The declared count for that space.
        count: u32,
    },

    /// An instruction line could not be parsed.
    #[error("malformed instruction: {0}")]
    MalformedInstruction(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
